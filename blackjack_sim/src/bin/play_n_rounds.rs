use blackjack_lib::prelude::*;
use blackjack_sim::prelude::*;
use blackjack_sim::PlayerStats;
use clap::Parser;

/// Plays a number of rounds at a single table and prints every round as it is played.
#[derive(Parser)]
#[command(name = "play_n_rounds")]
struct Args {
    /// Number of rounds to play
    rounds: u32,

    /// Seed for the shoe
    #[arg(long)]
    seed: Option<u64>,

    /// Number of packs in the shoe
    #[arg(long, default_value_t = 8)]
    decks: usize,

    /// Chips every player starts with
    #[arg(long, default_value_t = 500.0)]
    chips: f64,

    /// Only print the settled table of each round
    #[arg(long)]
    quiet: bool,

    /// A seat at the table as NAME:STRATEGY[:BET]
    #[arg(long = "player")]
    players: Vec<PlayerConfig>,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();

    let rules = Rules {
        num_decks: args.decks,
        ..Rules::default()
    };
    let seats = if args.players.is_empty() {
        vec![
            PlayerConfig::new("Mike", Strategy::SIMPLE, 10.0),
            PlayerConfig::new("Daniel", Strategy::Basic, 10.0),
        ]
    } else {
        args.players
    };
    let players = seats
        .iter()
        .map(|p| Player::new(p.name.clone(), args.chips, p.strategy).with_base_bet(p.bet))
        .collect();
    let shoe = match args.seed {
        Some(seed) => Shoe::with_seed(rules.num_decks, rules.shuffled, seed),
        None => Shoe::new(rules.num_decks, rules.shuffled),
    };

    let mut table = match Table::with_shoe(rules, players, shoe) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    };

    let mut renderer = TextRenderer::new(std::io::stdout()).results_only(args.quiet);
    let mut totals: Vec<PlayerStats> = seats
        .iter()
        .map(|p| PlayerStats::new(p.name.clone()))
        .collect();

    for _ in 0..args.rounds {
        if table.players().iter().all(|p| !p.continue_play(rules.min_bet)) {
            println!("every player is out of chips");
            break;
        }
        let result = match table.play_round(&mut FlatBet, &mut StrategyDecisions, &mut renderer) {
            Ok(r) => r,
            Err(e) => {
                eprintln!("error: {e}");
                std::process::exit(1);
            }
        };
        for (stats, player) in totals.iter_mut().zip(result.players.iter()) {
            stats.record(player);
        }
        println!();
    }

    println!("{}", "-".repeat(80));
    println!("{:-^80}", "stats");
    for (stats, player) in totals.iter().zip(table.players().iter()) {
        print!("{}", stats);
        println!("{:<45}{:>35.2}", "final balance", player.chips);
        println!("{}", "-".repeat(80));
    }
}
