#![deny(warnings)]

//! Headless CLI: expected gacha yield, synthesis outcome and goal planning.

use anyhow::{anyhow, bail, Context, Result};
use chrono::NaiveDate;
use gacha_core::{Catalog, GachaLevel, YieldVector};
use gacha_econ::{analyze, analyze_sampled};
use gacha_plan::{conversion_chain, plan_goal, Goal, GoalPlan};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;
use std::str::FromStr;
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Default)]
struct Args {
    catalog: Option<String>,
    level: Option<u8>,
    draws: Option<Decimal>,
    seed: Option<u64>,
    target: Option<String>,
    target_count: Option<Decimal>,
    daily: Option<Decimal>,
    start: Option<NaiveDate>,
    own: Vec<(String, Decimal)>,
    json: bool,
    version: bool,
}

fn parse_args<I: Iterator<Item = String>>(mut it: I) -> Result<Args> {
    let mut args = Args::default();
    while let Some(arg) = it.next() {
        let mut value = || it.next().ok_or_else(|| anyhow!("missing value for {arg}"));
        match arg.as_str() {
            "--catalog" => args.catalog = Some(value()?),
            "--level" => args.level = Some(value()?.parse().context("--level")?),
            "--draws" => args.draws = Some(Decimal::from_str(&value()?).context("--draws")?),
            "--seed" => args.seed = Some(value()?.parse().context("--seed")?),
            "--target" => args.target = Some(value()?),
            "--target-count" => {
                args.target_count = Some(Decimal::from_str(&value()?).context("--target-count")?)
            }
            "--daily" => args.daily = Some(Decimal::from_str(&value()?).context("--daily")?),
            "--start" => {
                args.start = Some(NaiveDate::parse_from_str(&value()?, "%Y-%m-%d").context("--start")?)
            }
            "--own" => {
                let v = value()?;
                let (code, qty) = v
                    .split_once('=')
                    .ok_or_else(|| anyhow!("--own expects CODE=QTY, got {v}"))?;
                args.own.push((code.to_string(), Decimal::from_str(qty).context("--own")?));
            }
            "--json" => args.json = true,
            "--version" => args.version = true,
            other => bail!("unknown argument: {other}"),
        }
    }
    Ok(args)
}

#[derive(Serialize)]
struct Row {
    grade: String,
    quantity: Decimal,
}

#[derive(Serialize)]
struct Report {
    level: u8,
    draws: Decimal,
    cost: Option<Decimal>,
    seed: Option<u64>,
    raw: Vec<Row>,
    synthesized: Vec<Row>,
    base_value: Decimal,
    chain: Vec<String>,
    goal: Option<GoalPlan>,
    completion_date: Option<NaiveDate>,
}

fn rows(catalog: &Catalog, v: &YieldVector) -> Vec<Row> {
    v.significant(Decimal::new(1, 2))
        .ranked(catalog)
        .into_iter()
        .map(|(g, q)| Row {
            grade: g.code.clone(),
            quantity: q.round_dp(2),
        })
        .collect()
}

fn build_report(catalog: &Catalog, args: &Args) -> Result<Report> {
    let level = GachaLevel(args.level.unwrap_or(14));
    let draws = args.draws.unwrap_or(Decimal::new(2000, 0));

    let (raw_yield, final_yield, cost) = match args.seed {
        Some(seed) => {
            if !draws.fract().is_zero() {
                bail!("--draws must be a whole number when sampling");
            }
            let n = draws
                .to_u64()
                .ok_or_else(|| anyhow!("--draws must be non-negative when sampling"))?;
            let s = analyze_sampled(catalog, level, n, seed)?;
            (s.raw_yield, s.final_yield, None)
        }
        None => {
            let a = analyze(catalog, level, draws)?;
            (a.raw_yield, a.final_yield, Some(a.cost))
        }
    };

    let target_code = args.target.clone().unwrap_or_else(|| catalog.terminal().code.clone());
    let target = catalog
        .id(&target_code)
        .ok_or_else(|| anyhow!("unknown target grade {target_code}"))?;
    let chain = conversion_chain(catalog, catalog.reference().id, target)
        .map(|steps| steps.iter().map(|s| s.to_string()).collect())
        .unwrap_or_default();

    let goal = match args.daily {
        Some(daily_rate) => {
            let mut inventory = YieldVector::new();
            for (code, qty) in &args.own {
                let id = catalog.id(code).ok_or_else(|| anyhow!("unknown grade {code}"))?;
                inventory.add(id, *qty);
            }
            Some(plan_goal(
                catalog,
                &Goal {
                    target,
                    quantity: args.target_count.unwrap_or(Decimal::ONE),
                    inventory,
                    daily_rate,
                },
            )?)
        }
        None => None,
    };
    let completion_date = match (&goal, args.start) {
        (Some(plan), Some(start)) => plan.completion_date(start),
        _ => None,
    };

    Ok(Report {
        level: level.0,
        draws,
        cost,
        seed: args.seed,
        raw: rows(catalog, &raw_yield),
        synthesized: rows(catalog, &final_yield),
        base_value: catalog
            .base_value(&final_yield)
            .ok_or_else(|| anyhow!("base-unit value overflows"))?,
        chain,
        goal,
        completion_date,
    })
}

fn print_report(r: &Report) {
    println!("Gacha level {} | draws: {}", r.level, r.draws);
    if let Some(cost) = r.cost {
        println!("Cost: {cost}");
    }
    if let Some(seed) = r.seed {
        println!("Sampled with seed {seed}");
    }
    println!("Raw yield:");
    for row in &r.raw {
        println!("  {:>3} {:>12}", row.grade, row.quantity);
    }
    println!("After synthesis:");
    for row in &r.synthesized {
        println!("  {:>3} {:>12}", row.grade, row.quantity);
    }
    println!("Base-unit value: {}", r.base_value.round_dp(2));
    if !r.chain.is_empty() {
        println!("Synthesis path:");
        for step in &r.chain {
            println!("  {step}");
        }
    }
    if let Some(plan) = &r.goal {
        println!(
            "Goal | required: {} | owned: {} | shortfall: {} | days: {} | progress: {}%",
            plan.required,
            plan.owned.round_dp(2),
            plan.shortfall.round_dp(2),
            plan.days,
            plan.progress_percent
        );
    }
    if let Some(date) = r.completion_date {
        println!("Completion date: {date}");
    }
}

fn main() -> Result<()> {
    // Logging setup
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_max_level(Level::INFO)
        .with_writer(std::io::stderr)
        .init();

    let args = parse_args(std::env::args().skip(1))?;
    if args.version {
        println!("gacha-cli {} ({} {})", env!("CARGO_PKG_VERSION"), env!("GIT_SHA"), env!("BUILD_DATE"));
        return Ok(());
    }
    info!(catalog = ?args.catalog, level = ?args.level, draws = ?args.draws, "starting CLI");

    let catalog = match &args.catalog {
        Some(path) => Catalog::from_yaml_path(path)?,
        None => Catalog::standard()?,
    };
    let report = build_report(&catalog, &args)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}
