use clap::{Parser, ValueEnum};
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    style, terminal, QueueableCommand,
};
use ditherscape::{
    color::{term_color, CrosstermColorMode, Tint},
    config::VariantConfig,
    extra::{driver::FrameDriver, Ctx},
    framebuffer::Rgba,
    scene::{Group, Layout, SceneParameters, Step},
};
use std::io::{stdout, Write};
use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::{Duration, Instant};

#[derive(ValueEnum, Debug, Clone, Copy)]
enum Variant {
    Hero,
    Studio,
    Workflow,
}

impl From<Variant> for Layout {
    fn from(v: Variant) -> Self {
        match v {
            Variant::Hero => Layout::Hero,
            Variant::Studio => Layout::Studio,
            Variant::Workflow => Layout::Workflow,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum Colors {
    Gray,
    Ansi256,
    Rgb,
}

impl From<Colors> for CrosstermColorMode {
    fn from(v: Colors) -> Self {
        match v {
            Colors::Gray => CrosstermColorMode::Gray,
            Colors::Ansi256 => CrosstermColorMode::Ansi256,
            Colors::Rgb => CrosstermColorMode::Rgb,
        }
    }
}

#[derive(Parser, Debug, Clone)]
#[command(name = "sample")]
#[command(about = "Dithered box scene in the terminal", long_about = None)]
struct Args {
    /// Scene preset
    #[arg(long, value_enum, default_value_t = Variant::Hero)]
    variant: Variant,

    /// JSON config file, overrides the preset
    #[arg(long)]
    config: Option<PathBuf>,

    /// Initial intensity, [0; 1]
    #[arg(long, default_value_t = 0.5)]
    intensity: f32,

    /// Tint hue in degrees. Monochrome if not set
    #[arg(long)]
    hue: Option<f64>,

    /// Terminal color output
    #[arg(long, value_enum, default_value_t = Colors::Rgb)]
    colors: Colors,

    /// Drive intensity and workflow steps automatically
    #[arg(long, default_value_t = false)]
    autoplay: bool,

    /// FPS cap
    #[arg(long, default_value_t = 60)]
    fps: u64,
}

/// Scripted walk through the parameter space.
///
/// Intensity ramps up over 5 seconds, while steps `0..=9` advance every 800 ms. The last step is
/// held for 2 seconds before starting over.
struct Autoplay;

impl Autoplay {
    const STEP_TIME: f32 = 0.8;
    const HOLD_TIME: f32 = 2.0;
    const LAST_STEP: u8 = 9;

    fn intensity(t: f32) -> f32 {
        (t * 0.2) % 1.0
    }

    fn step(t: f32) -> u8 {
        let cycle = Self::STEP_TIME * (Self::LAST_STEP as f32 + 1.0) + Self::HOLD_TIME;
        let t = t % cycle;
        ((t / Self::STEP_TIME) as u8).min(Self::LAST_STEP)
    }

    fn apply(t: f32, params: &mut SceneParameters) {
        params.intensity = Self::intensity(t);
        params.step = Step::from_index(Self::step(t));
        params.generating = params.step == Step::Generating;
    }
}

/// Handles sample-specific keys. Returns whether the scene parameters changed.
fn handle_key(code: KeyCode, params: &mut SceneParameters, autoplay: &mut bool) -> bool {
    match code {
        KeyCode::Up => params.intensity += 0.05,
        KeyCode::Down => params.intensity -= 0.05,
        KeyCode::Char(']') => params.height += 5.0,
        KeyCode::Char('[') => params.height -= 5.0,
        KeyCode::Char('=') => params.density += 5.0,
        KeyCode::Char('-') => params.density -= 5.0,
        KeyCode::Char('g') => params.generating = !params.generating,
        KeyCode::Char('n') => params.step = params.step.next(),
        KeyCode::Char('c') => params.visibility.core = !params.visibility.core,
        KeyCode::Char('f') => {
            let vis = !params.visibility.is_visible(Group::Facade);
            params.visibility.set(Group::Facade, vis);
        }
        KeyCode::Char('a') => *autoplay = !*autoplay,
        _ => return false,
    }
    true
}

fn pixel_color(px: Rgba, tint: &Tint, mode: CrosstermColorMode) -> style::Color {
    if px.a == 0 {
        style::Color::Reset
    } else {
        term_color(tint.apply(px.r), mode)
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => VariantConfig::load(path)?,
        None => VariantConfig::for_layout(args.variant.into()),
    };

    let tint = args.hue.map_or_else(Tint::mono, |hue| Tint::new(hue, 60.0, 50.0));
    let color_mode = CrosstermColorMode::from(args.colors);
    let mut autoplay = args.autoplay;

    let mut driver = FrameDriver::new(config);
    let mut params = SceneParameters {
        intensity: args.intensity,
        ..Default::default()
    };
    driver.set_params(params);

    let mut stdout = stdout();
    stdout.queue(cursor::Hide)?;
    stdout.queue(event::EnableMouseCapture)?;

    // In case we get an outside sigterm/sigint, we want to gracefully shutdown without leaving the
    // terminal in raw mode.
    let stop = Arc::new(AtomicBool::new(false));

    signal_hook::flag::register(signal_hook::consts::SIGTERM, stop.clone())?;
    signal_hook::flag::register(signal_hook::consts::SIGINT, stop.clone())?;

    terminal::enable_raw_mode()?;

    let (tx, rx) = std::sync::mpsc::channel();
    let _ = std::thread::spawn(move || {
        while let Ok(e) = event::read() {
            if tx.send(e).is_err() {
                break;
            }
        }
    });

    // Status line on top
    const Y_OFF: u16 = 1;

    let mut ctx = Ctx::default();
    let mut size = None;
    let time = Instant::now();
    let frametime_target = Duration::from_millis(1000 / args.fps.max(1));

    driver.start();

    while !stop.load(Ordering::SeqCst) && !ctx.should_stop {
        let start = time.elapsed();

        let (cols, rows) = terminal::size()?;
        let rows = rows.saturating_sub(Y_OFF);
        ctx.new_frame(0, Y_OFF, cols, rows);

        // Each cell shows 2 vertically stacked pixels, at the default downscale of 2
        if size != Some((cols, rows)) {
            size = Some((cols, rows));
            driver.resize(cols as u32 * 2, rows as u32 * 4);
        }

        while let Ok(e) = rx.try_recv() {
            if let Event::Key(KeyEvent {
                code,
                kind: KeyEventKind::Press,
                ..
            }) = e
            {
                if matches!(code, KeyCode::Char('q') | KeyCode::Esc) {
                    ctx.should_stop = true;
                }
                if handle_key(code, &mut params, &mut autoplay) {
                    driver.set_params(params);
                    params = driver.params();
                }
            }
            ctx.event(e);
        }

        driver.update(&ctx);

        let t = start.as_secs_f32();

        if autoplay {
            Autoplay::apply(t, &mut params);
            driver.set_params(params);
        }

        let Some(frame) = driver.tick(t) else {
            break;
        };

        for (y, pair) in frame.rows().collect::<Vec<_>>().chunks(2).enumerate() {
            stdout.queue(cursor::MoveTo(0, y as u16 + Y_OFF))?;
            for x in 0..pair[0].len() {
                let top = pair[0][x];
                let bottom = pair.get(1).map_or(Rgba::TRANSPARENT, |r| r[x]);
                stdout.queue(style::SetColors(style::Colors {
                    foreground: Some(pixel_color(top, &tint, color_mode)),
                    background: Some(pixel_color(bottom, &tint, color_mode)),
                }))?;
                stdout.queue(style::Print('▀'))?;
            }
        }

        let stats = driver.stats();
        let drawn = time.elapsed();

        stdout.queue(cursor::MoveTo(0, 0))?;
        stdout.queue(style::ResetColor)?;
        stdout.queue(terminal::Clear(terminal::ClearType::CurrentLine))?;
        stdout.queue(style::Print(format!(
            "{:?} {:?} i={:.2} h={:.0} d={:.0} {}{:.02}FPS {} boxes {} px",
            driver.config().layout,
            params.step,
            params.intensity,
            params.height,
            params.density,
            if autoplay { "[auto] " } else { "" },
            1.0 / (drawn - start).as_secs_f32().max(1e-6),
            stats.boxes,
            stats.pixels,
        )))?;

        stdout.flush()?;

        let drawn_delta = time.elapsed() - start;
        if drawn_delta < frametime_target {
            std::thread::sleep(frametime_target - drawn_delta);
        }
    }

    driver.teardown();

    terminal::disable_raw_mode()?;

    stdout.queue(style::ResetColor)?;
    stdout.queue(event::DisableMouseCapture)?;
    stdout.queue(cursor::Show)?;
    stdout.flush()?;

    Ok(())
}
