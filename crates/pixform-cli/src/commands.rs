//! Subcommand implementations.

use std::io::{self, Write};

use pixform_core::{Channel, EvalContext, Formula, Symbol, SymbolTable};
use pixform_render::{RenderConfig, Renderer, load_image, save_image};

use crate::args::{GraphFormat, RenderArgs};
use crate::error::CliError;

pub fn eval(
    expr: &str,
    x: f64,
    y: f64,
    width: u32,
    height: u32,
    optimize: bool,
) -> Result<f64, CliError> {
    let mut formula = Formula::new(expr, false)?;
    if optimize {
        formula.optimize();
    }

    let mut ctx = EvalContext::new();
    ctx.set_width(f64::from(width));
    ctx.set_height(f64::from(height));
    ctx.set_x(x);
    ctx.set_y(y);
    ctx.set_polar_from_cartesian(x - f64::from(width / 2), -(y - f64::from(height / 2)));
    Ok(formula.evaluate(&mut ctx))
}

pub fn graph(
    expr: &str,
    optimize: bool,
    format: GraphFormat,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let mut formula = Formula::new(expr, false)?;
    if optimize {
        formula.optimize();
    }
    match format {
        GraphFormat::Xml => formula.serialize(out)?,
        GraphFormat::Json => writeln!(out, "{}", formula.graph().to_json()?)?,
    }
    Ok(())
}

/// Config file (or defaults) with command-line overrides applied.
pub fn build_config(args: &RenderArgs) -> Result<RenderConfig, CliError> {
    let mut config = match &args.config {
        Some(path) => RenderConfig::load(path)?,
        None => RenderConfig::default(),
    };

    let overrides = [
        (Channel::Red, &args.red),
        (Channel::Green, &args.green),
        (Channel::Blue, &args.blue),
        (Channel::Gray, &args.gray),
        (Channel::Alpha, &args.alpha),
    ];
    for (channel, text) in overrides {
        if let Some(text) = text {
            config.set_formula(channel, text.as_str());
        }
    }
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if args.no_optimize {
        config.optimize = false;
    }
    if args.sequential {
        config.parallel = false;
    }
    Ok(config)
}

pub fn render(args: &RenderArgs) -> Result<(), CliError> {
    let renderer = Renderer::new(build_config(args)?).report_errors(false);
    let source = load_image(&args.input)?;
    let output = renderer.render(&source)?;
    save_image(&output, &args.output)?;
    tracing::info!("Wrote {}", args.output.display());
    Ok(())
}

pub fn preview(args: &RenderArgs, width: u32, height: u32) -> Result<(), CliError> {
    let renderer = Renderer::new(build_config(args)?).report_errors(false);
    let source = load_image(&args.input)?;
    let output = renderer.render_preview(&source, width, height)?;
    save_image(&output, &args.output)?;
    tracing::info!("Wrote {width}x{height} preview to {}", args.output.display());
    Ok(())
}

pub fn symbols(out: &mut impl Write) -> io::Result<()> {
    for symbol in SymbolTable::global().iter() {
        let (kind, shown) = match symbol {
            Symbol::Operator(op) => ("operator", op.key.to_string()),
            Symbol::Value(value) => ("value", value.key.to_string()),
            Symbol::Function(func) => ("function", format!("{})", func.key)),
        };
        writeln!(out, "{kind:<9} {shown:<8} {}", symbol.description())?;
    }
    Ok(())
}
