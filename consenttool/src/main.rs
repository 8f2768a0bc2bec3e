use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use iab_consent::config::{Configuration, ConsentStatus};
use iab_consent::policy::{encode_ccpa, encode_tcf_with, TcfSettings};
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Args)]
struct Inputs {
    /// JSON file containing the consent configuration
    #[arg(short, long)]
    configuration: PathBuf,
    /// JSON file containing the user's decisions
    #[arg(short = 's', long)]
    consent: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode a TCF v2 TC String
    Tcf {
        #[command(flatten)]
        inputs: Inputs,
        /// Version of the global vendor list
        #[arg(short, long)]
        vendor_list_version: u16,
        /// CMP ID registered with the IAB
        #[arg(long, default_value_t = TcfSettings::default().cmp_id)]
        cmp_id: u16,
        /// Add a disclosed vendors segment listing every vendor of the configuration
        #[arg(long)]
        disclose_vendors: bool,
    },
    /// Encode a CCPA US Privacy string
    Ccpa {
        #[command(flatten)]
        inputs: Inputs,
        /// The user was given notice of the opportunity to opt out
        #[arg(long)]
        notice: bool,
        /// The publisher is a signatory to the IAB LSPA
        #[arg(long)]
        lspa: bool,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Cli::parse();

    let e = match args.cmd {
        Commands::Tcf {
            inputs,
            vendor_list_version,
            cmp_id,
            disclose_vendors,
        } => {
            let settings = TcfSettings {
                cmp_id,
                disclose_vendors,
                ..Default::default()
            };
            encode_tcf_string(&inputs, vendor_list_version, &settings)
        }
        Commands::Ccpa {
            inputs,
            notice,
            lspa,
        } => encode_us_privacy_string(&inputs, notice, lspa),
    };

    if let Err(e) = e {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

fn encode_tcf_string(
    inputs: &Inputs,
    vendor_list_version: u16,
    settings: &TcfSettings,
) -> Result<(), Box<dyn std::error::Error>> {
    let (configuration, status) = inputs.load()?;

    let s = encode_tcf_with(
        &configuration,
        &status,
        vendor_list_version,
        settings,
        Utc::now(),
    )?;
    println!("{s}");

    Ok(())
}

fn encode_us_privacy_string(
    inputs: &Inputs,
    notice: bool,
    lspa: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let (configuration, status) = inputs.load()?;

    println!("{}", encode_ccpa(&configuration, &status, notice, lspa));

    Ok(())
}

impl Inputs {
    fn load(&self) -> Result<(Configuration, ConsentStatus), Box<dyn std::error::Error>> {
        let configuration: Configuration = read_json(&self.configuration)?;
        let status: ConsentStatus = read_json(&self.consent)?;
        debug!(
            purposes = configuration.purposes.len(),
            decisions = status.purposes.len(),
            "loaded inputs"
        );

        Ok((configuration, status))
    }
}

fn read_json<T, P>(p: P) -> Result<T, Box<dyn std::error::Error>>
where
    T: serde::de::DeserializeOwned,
    P: AsRef<Path>,
{
    let p = p.as_ref();
    let f = File::open(p).map_err(|e| format!("{}: {e}", p.display()))?;
    let value = serde_json::from_reader(&f).map_err(|e| format!("{}: {e}", p.display()))?;
    Ok(value)
}
