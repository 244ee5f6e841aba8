use std::env;
use std::fs;
use std::process::exit;

use clap::Parser;
#[allow(unused_imports)]
use log::{debug, info};

use alnbench_predict::{
    OptionSet, PredictEvent, PsiBlastStructureTool, DATABASE_OPT, EVALUE_OPT, ITERATIONS_OPT,
    THREADS_OPT,
};
use alnbench_seq::{BioString, Grammar};

#[derive(Parser, Debug)]
#[clap(name = "predict_secondary")]
#[clap(about = "Predicts protein secondary structure with PSI-BLAST and a two-stage neural network", long_about = None)]
struct Args {
    /// query sequence file, FASTA or plain residues
    #[clap(short = 'q', long, required = true)]
    query: String,
    /// BLAST database to search
    #[clap(short = 'd', long, required = true)]
    db: String,
    /// path to the psiblast executable
    #[clap(long, default_value = "psiblast")]
    psiblast: String,
    /// stage-1 neural network file
    #[clap(long, default_value = "data/nn-sec-stage1.net")]
    stage1: String,
    /// stage-2 neural network file
    #[clap(long, default_value = "data/nn-sec-stage2.net")]
    stage2: String,
    /// number of PSI-BLAST iterations; a PSSM needs at least 2
    #[clap(short = 'j', long, default_value_t = 3)]
    iterations: u32,
    /// e-value inclusion threshold
    #[clap(short = 'e', long)]
    evalue: Option<f64>,
    /// number of PSI-BLAST threads
    #[clap(short = 't', long, default_value_t = 1)]
    threads: usize,
    /// be more verbose and log program actions on the screen
    #[clap(short = 'v', long)]
    verbose: bool,
}

pub fn main() {
    let args = Args::parse();
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info")
    }
    if args.verbose {
        env::set_var("RUST_LOG", "debug");
    }
    env_logger::init();

    let query_text = match fs::read_to_string(&args.query) {
        Ok(text) => text,
        Err(error) => {
            eprintln!("can't read query file {}: {}", args.query, error);
            exit(1);
        }
    };
    let residues: String = query_text
        .lines()
        .filter(|line| !line.starts_with('>'))
        .collect();
    let sequence = BioString::new(residues, Grammar::Amino);
    if sequence.ungapped_length() == 0 {
        eprintln!("query file {} holds no residues", args.query);
        exit(1);
    }

    let mut options = OptionSet::new();
    options.set(ITERATIONS_OPT, args.iterations);
    options.set(DATABASE_OPT, &args.db);
    options.set(THREADS_OPT, args.threads);
    if let Some(evalue) = args.evalue {
        options.set(EVALUE_OPT, evalue);
    }

    let mut tool = PsiBlastStructureTool::new(&args.psiblast, options, &args.stage1, &args.stage2);
    tool.predict_secondary(1, &sequence);

    loop {
        match tool.events().recv() {
            Ok(PredictEvent::ProgressChanged { current, total }) => {
                debug!("search progress: {} / {}", current, total);
            }
            Ok(PredictEvent::Finished { prediction, .. }) => {
                if prediction.is_empty() {
                    info!("no PSI-BLAST hits to query");
                } else {
                    println!("{}", prediction.q3_string());
                    println!("{}", prediction.encode_confidence());
                }
                break;
            }
            Ok(PredictEvent::Error { message, .. }) => {
                eprintln!("prediction failed: {}", message);
                exit(1);
            }
            Ok(PredictEvent::Canceled { .. }) | Err(_) => break,
        }
    }
}
