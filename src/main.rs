use std::borrow::Cow;
use std::collections::HashMap;

use anyhow::{Context, Result};
use clap::Parser;

use tile_widgets::cli::{Cli, Command, EvalExprArgs, ReportFormat};
use tile_widgets::output::{ndjson_lines, text_lines};
use tile_widgets::request::{read_request, run_request};
use tile_widgets::vecexpr::{VecValue, create_vec_expr_evaluator, validate_vec_expr_syntax};

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log);

    match cli.command {
        Command::Run(args) => {
            let request = read_request(&args.request)?;
            let report = run_request(&request)?;
            match args.output {
                ReportFormat::Json => {
                    let json = serde_json::to_string_pretty(&report)?;
                    println!("{}", json);
                }
                ReportFormat::Ndjson => {
                    for line in ndjson_lines(&report)? {
                        println!("{}", line);
                    }
                }
                ReportFormat::Text => {
                    for line in text_lines(&report) {
                        println!("{}", line);
                    }
                }
            }
        }
        Command::ValidateExpr(args) => {
            let validation = validate_vec_expr_syntax(&args.expression, args.symbols.as_slice());
            println!("{}", serde_json::to_string(&validation)?);
        }
        Command::EvalExpr(args) => eval_expr(&args)?,
    }

    Ok(())
}

fn eval_expr(args: &EvalExprArgs) -> Result<()> {
    let evaluator = create_vec_expr_evaluator(&args.expression)
        .with_context(|| format!("invalid expression: {}", args.expression))?;
    let mut bindings: HashMap<String, Vec<f64>> = HashMap::new();
    for var in args.vars.iter() {
        let (name, values) = var
            .split_once('=')
            .with_context(|| format!("binding must be name=value: {var}"))?;
        let values = values
            .split(',')
            .map(|value| {
                value
                    .trim()
                    .parse::<f64>()
                    .with_context(|| format!("invalid number in binding {name}: {value}"))
            })
            .collect::<Result<Vec<_>>>()?;
        bindings.insert(name.trim().to_string(), values);
    }

    let result = evaluator.evaluate_vectorized(|name| {
        bindings.get(name).map(|values| match values.as_slice() {
            [single] => VecValue::Scalar(*single),
            many => VecValue::Vector(Cow::Borrowed(many)),
        })
    });
    match result {
        Some(VecValue::Scalar(value)) => println!("{}", value),
        Some(VecValue::Vector(values)) => println!(
            "{}",
            values
                .iter()
                .map(|value| value.to_string())
                .collect::<Vec<_>>()
                .join(",")
        ),
        None => println!("null"),
    }
    Ok(())
}

fn init_tracing(level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_new(level)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
