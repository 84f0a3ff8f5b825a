use std::path::{Path, PathBuf};

use anyhow::Context as _;
use canvasfx::{
    BlendMode, Bitmap, Canvas, Channel, Color, CompositingContext, CpuSurface, CpuSurfaceOpts,
    Effect, EffectSpec, Grob, Rect, Shape, ShadowSpec, Stencil,
};
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "canvasfx", version)]
struct Cli {
    /// Log effect scopes and layer activity to stderr.
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the accepted blend mode names.
    BlendModes,
    /// Write the coverage mask a bitmap stencil would clip with, as a greyscale PNG.
    Mask(MaskArgs),
    /// Render a sample scene with nested effects, shadows and stencils.
    Demo(DemoArgs),
}

#[derive(Parser, Debug)]
struct MaskArgs {
    /// Input image.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Channel to cut the mask from (red, green, blue, alpha, luminance).
    #[arg(long, value_parser = Channel::parse)]
    channel: Option<Channel>,

    /// Swap the visible and hidden areas.
    #[arg(long)]
    invert: bool,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct DemoArgs {
    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    #[arg(long, default_value_t = 512)]
    width: u32,

    #[arg(long, default_value_t = 320)]
    height: u32,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(if cli.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::WARN
        })
        .init();

    match cli.cmd {
        Command::BlendModes => {
            println!("{}", BlendMode::help());
            Ok(())
        }
        Command::Mask(args) => cmd_mask(args),
        Command::Demo(args) => cmd_demo(args),
    }
}

fn cmd_mask(args: MaskArgs) -> anyhow::Result<()> {
    let bitmap = Bitmap::open(&args.in_path)?;
    let stencil = Stencil::new(&bitmap, args.invert, args.channel)?;
    let mask = stencil
        .mask()?
        .context("bitmap stencil produced no coverage mask")?;

    let img = image::GrayImage::from_raw(mask.width, mask.height, mask.data)
        .context("coverage mask has the wrong size")?;
    create_parent(&args.out)?;
    img.save(&args.out)
        .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_demo(args: DemoArgs) -> anyhow::Result<()> {
    let canvas = Canvas::new(args.width, args.height);
    let surface = CpuSurface::new(
        canvas,
        CpuSurfaceOpts::default().with_clear_rgba(Some([245, 242, 235, 255])),
    )?;
    let mut ctx = CompositingContext::new(surface);
    let (w, h) = (f64::from(args.width), f64::from(args.height));

    // Card with a drop shadow.
    let mut card = Effect::new(
        EffectSpec::default().shadow(ShadowSpec::default().blur(12.0).offset((6.0, 8.0))),
    )?;
    card.scoped(&mut ctx, |ctx| {
        ctx.draw(&Grob::fill(
            Shape::rect(Rect::new(w * 0.06, h * 0.1, w * 0.46, h * 0.9)),
            Color::parse("steelblue")?,
        ))
    })?;

    // Overlapping discs multiplied onto the card as one group.
    let mut discs = Effect::new(EffectSpec::default().blend("multiply").alpha(0.85))?;
    let r = h * 0.22;
    for (cx, color) in [(0.38, "gold"), (0.52, "tomato"), (0.66, "#3cb371")] {
        discs.append(Grob::fill(
            Shape::circle((w * cx, h * 0.5), r),
            Color::parse(color)?,
        ));
    }
    ctx.draw(&Grob::Group(discs))?;

    // Stripes with a hole knocked out by an inverted stencil, at half ambient alpha.
    let hole = Stencil::new(&Shape::circle((w * 0.82, h * 0.5), r * 0.6), true, None)?;
    let stripes: Vec<Grob> = (0..8)
        .map(|i| {
            let y = h * (0.1 + 0.1 * f64::from(i));
            Grob::fill(
                Shape::rect(Rect::new(w * 0.7, y, w * 0.94, y + h * 0.05)),
                Color::rgba(0.2, 0.2, 0.3, 1.0),
            )
        })
        .collect();
    let mut faded = ctx.set_alpha(0.5)?;
    faded.scoped(&mut ctx, |ctx| ctx.draw(&Grob::masked(hole, stripes)))?;

    create_parent(&args.out)?;
    ctx.surface()
        .to_rgba_image()?
        .save(&args.out)
        .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn create_parent(out: &Path) -> anyhow::Result<()> {
    if let Some(parent) = out.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    Ok(())
}
