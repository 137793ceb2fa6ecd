use std::{path::PathBuf, rc::Rc};

use anyhow::Context;
use ballot_client::{
    flows::VoteRecord,
    local::{LocalChain, LocalWallet},
    ClientConfig, ElectionSnapshot, VotingSession, WalletSession,
};
use clap::Parser;
use log::{info, warn};
use serde::Serialize;
use solana_sdk::{native_token::LAMPORTS_PER_SOL, signature::Keypair};

#[derive(Parser, Debug)]
#[command(about = "Run a ballot on an in-process chain", author, version)]
struct Args {
    /// Client config (JSON)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Compiled ballot program
    #[arg(long, default_value = "target/deploy/ballot.so")]
    program: PathBuf,
    /// Initial candidates, comma separated
    #[arg(long, value_delimiter = ',', default_value = "Alice,Bob,Charlie")]
    candidates: Vec<String>,
    /// Voting window in seconds, 0 for none
    #[arg(long, default_value_t = 3600)]
    deadline_secs: u64,
    /// Candidate to add as admin before voting
    #[arg(long)]
    add_candidate: Option<String>,
    /// 1-based candidate id to vote for
    #[arg(long)]
    vote: Option<u32>,
    /// Print the final state as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct Report<'a> {
    wallet: &'a WalletSession,
    vote: VoteRecord,
    election: Option<&'a ElectionSnapshot>,
}

fn session(config: &ClientConfig, chain: &LocalChain, keypair: Keypair) -> VotingSession {
    let wallet = LocalWallet::new(chain.clone(), vec![keypair]);
    VotingSession::new(config.clone(), Some(Rc::new(wallet)), Rc::new(chain.clone())).with_clock(Rc::new(chain.clone()))
}

fn print_text(session: &VotingSession) {
    let wallet = session.wallet();
    if let Some(address) = wallet.address() {
        println!("wallet:  {} ({} SOL)", address, wallet.balance());
    }
    let Some(election) = session.election() else {
        println!("no election loaded");
        return;
    };
    println!("{}", election.title);
    println!("{}", election.description);
    for candidate in &election.candidates {
        println!(
            "  #{:<3} {:<24} {:>6} ({:.1}%)",
            candidate.id,
            candidate.name,
            candidate.vote_count,
            election.percentage(candidate.id)
        );
    }
    let status = if election.is_active { "open" } else { "closed" };
    match election.end_time {
        Some(end) => println!("total {} votes, voting {} until {}", election.total_votes, status, end),
        None => println!("total {} votes, voting {}", election.total_votes, status),
    }
    let record = session.vote_record();
    match record.user_vote {
        Some(id) => println!("you voted for #{}", id),
        None if record.has_voted => println!("you already voted"),
        None => println!("you have not voted"),
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => ClientConfig::load(path)?,
        None => ClientConfig::default(),
    };

    let chain = LocalChain::from_config(&config);
    chain
        .load_program(&args.program)
        .context("run `anchor build` first or pass --program")?;

    let admin = chain.create_funded_keypair(10 * LAMPORTS_PER_SOL)?;
    let ballot = chain.deploy_ballot(&admin, &args.candidates, args.deadline_secs)?;
    let config = config.with_ballot(ballot);

    // Admin session doubles as a live observer of other wallets' votes
    let mut observer = session(&config, &chain, admin);
    observer.connect()?;
    if let Some(name) = &args.add_candidate {
        let receipt = observer.add_candidate(name)?;
        info!("added candidate {:?} in {}", name, receipt.signature);
        if let Err(err) = receipt.refresh {
            warn!("results may be stale: {}", err);
        }
    }

    let voter = chain.create_funded_keypair(2 * LAMPORTS_PER_SOL)?;
    let mut voting = session(&config, &chain, voter);
    voting.connect()?;

    if let Some(candidate_id) = args.vote {
        let receipt = voting.vote(candidate_id)?;
        info!("voted for #{} in {}", receipt.candidate_id, receipt.signature);
        if let Err(err) = receipt.refresh {
            warn!("results may be stale: {}", err);
        }
        let updates = observer.poll_updates()?;
        info!("admin session saw {} live update(s)", updates);
    }

    if args.json {
        let report = Report {
            wallet: voting.wallet(),
            vote: voting.vote_record(),
            election: voting.election(),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_text(&voting);
    }

    voting.disconnect();
    observer.disconnect();
    Ok(())
}
