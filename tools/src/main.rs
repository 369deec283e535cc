//! assess-runner: headless credit-assessment demo for GrabCredit.
//!
//! Usage:
//!   assess-runner --seed 42 --db demo.db --amount 5000
//!   assess-runner --db demo.db --user 55555555-5555-5555-5555-555555555555 --json

use anyhow::Result;
use chrono::Utc;
use grabcredit_core::{
    assessment::Assessment, config::EngineConfig, engine::AssessmentEngine, seed,
    source::UserProfile, store::SqliteStore,
};
use std::env;
use std::sync::Arc;

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let seed_value = parse_arg(&args, "--seed", 42u64);
    let amount = parse_arg(&args, "--amount", 5_000.0f64);
    let json_output = args.iter().any(|a| a == "--json");
    let db = flag_value(&args, "--db").unwrap_or(":memory:");
    let user_filter = flag_value(&args, "--user");

    let config = match flag_value(&args, "--config") {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };

    if !json_output {
        println!("GrabCredit — assess-runner");
        println!("  seed:    {seed_value}");
        println!("  db:      {db}");
        println!("  amount:  ₹{amount:.0}");
        println!();
    }

    let store = Arc::new(SqliteStore::open(db)?);
    store.migrate()?;

    if store.user_count()? == 0 {
        seed::seed_store(&store, seed_value, Utc::now())?;
        log::info!("seeded {} personas into {db}", seed::PERSONAS.len());
        if !json_output {
            println!("Seeded {} demo personas.", seed::PERSONAS.len());
            println!();
        }
    }

    let engine = AssessmentEngine::build(config, store.clone());

    let users: Vec<UserProfile> = match user_filter {
        Some(user_id) => match store.get_user(user_id)? {
            Some(profile) => vec![profile],
            None => anyhow::bail!("user {user_id} not found"),
        },
        None => store.all_users()?,
    };

    for profile in &users {
        let assessment = engine.assess(&profile.user_id, amount)?;
        if json_output {
            println!("{}", serde_json::to_string_pretty(&assessment)?);
        } else {
            print_summary(profile, &assessment);
        }
    }

    Ok(())
}

fn print_summary(profile: &UserProfile, assessment: &Assessment) {
    match assessment {
        Assessment::Completed(a) => {
            println!(
                "{} ({}): score {:.1} | tier {} | limit ₹{:.0} | {} | {} EMI offer(s)",
                profile.name,
                profile.risk_segment,
                a.composite_score,
                a.risk_tier.as_str(),
                a.recommended_limit,
                if a.approved { "approved" } else { "not approved" },
                a.emi_offers.len(),
            );
        }
        Assessment::Denied(d) => {
            println!(
                "{} ({}): DENIED — {}",
                profile.name, profile.risk_segment, d.reason
            );
        }
    }
}

fn parse_arg<T: std::str::FromStr>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}
