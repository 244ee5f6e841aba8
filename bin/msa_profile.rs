use std::env;
use std::fs;
use std::process::exit;
use std::sync::Arc;

use clap::Parser;
#[allow(unused_imports)]
use log::{debug, info};

use alnbench_msa::{CharCountDistribution, Msa};
use alnbench_seq::{BioString, Grammar, ParentSeq, Subseq};

#[derive(Parser, Debug)]
#[clap(name = "msa_profile")]
#[clap(about = "Prints per-column character counts for a multiple sequence alignment", long_about = None)]
struct Args {
    /// input alignment in the FASTA format
    #[clap(short = 'f', long, required = true)]
    in_fasta: String,
    /// treat the sequences as DNA rather than protein
    #[clap(long)]
    dna: bool,
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

    let grammar = if args.dna { Grammar::Dna } else { Grammar::Amino };

    let text = match fs::read_to_string(&args.in_fasta) {
        Ok(text) => text,
        Err(error) => {
            eprintln!("can't read alignment file {}: {}", args.in_fasta, error);
            exit(1);
        }
    };

    let mut msa = Msa::new(1, grammar);
    let mut label = String::new();
    let mut gapped_rows: Vec<(String, String)> = Vec::new();
    let mut current = String::new();
    for line in text.lines() {
        let line = line.trim();
        if line.starts_with('>') {
            if !current.is_empty() {
                gapped_rows.push((label.clone(), current.clone()));
                current.clear();
            }
            label = line[1..].trim().to_string();
        } else {
            current.push_str(line);
        }
    }
    if !current.is_empty() {
        gapped_rows.push((label, current));
    }

    for (label, gapped_text) in gapped_rows {
        let gapped = BioString::new(&gapped_text, grammar);
        let parent = Arc::new(ParentSeq::new(gapped.clone()));
        let mut subseq = Subseq::new(parent);
        if !subseq.set_gapped(gapped) {
            eprintln!("row {} holds no residues", label);
            exit(1);
        }
        subseq.set_label(label.as_str());
        if let Err(error) = msa.append(subseq) {
            eprintln!("can't append row {}: {}", label, error);
            exit(1);
        }
    }
    if msa.is_empty() {
        eprintln!("no sequences found in {}", args.in_fasta);
        exit(1);
    }
    info!("loaded {} rows of {} columns", msa.row_count(), msa.length());

    let dist = CharCountDistribution::from_msa(&msa);
    print!("{}", dist);
}
