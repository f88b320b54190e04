use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use nai::{Action, ClientConfig, Credentials, Host, Model, NoiseSchedule, Resolution, Sampler, SessionOptions};

#[derive(Parser, Debug)]
#[command(name = "nai")]
#[command(about = "NovelAI image generation from the command line")]
#[command(version)]
pub struct Cli {
    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Log in and print an access token
    Login {
        #[command(flatten)]
        credentials: CredentialArgs,
        #[command(flatten)]
        connection: ConnectionArgs,
    },

    /// Generate images and save them to a directory
    #[command(alias = "gen")]
    Generate(GenerateArgs),

    /// Estimate the Anlas cost of a request without sending it
    Cost {
        #[command(flatten)]
        params: ParamArgs,
        /// Apply the Opus free-generation discount
        #[arg(long)]
        opus: bool,
    },
}

#[derive(Args, Debug)]
pub struct GenerateArgs {
    #[command(flatten)]
    pub params: ParamArgs,

    #[command(flatten)]
    pub credentials: CredentialArgs,

    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Host to generate on (api, web)
    #[arg(long, default_value = "api")]
    pub host: Host,

    /// Directory to save images into
    #[arg(short, long, default_value = "output")]
    pub output: PathBuf,

    /// Account has an Opus subscription (affects the logged cost)
    #[arg(long)]
    pub opus: bool,
}

#[derive(Args, Debug, Clone)]
pub struct CredentialArgs {
    /// Account email
    #[arg(long, env = "NAI_USERNAME")]
    pub username: String,

    /// Account password
    #[arg(long, env = "NAI_PASSWORD", hide_env_values = true)]
    pub password: String,
}

impl CredentialArgs {
    pub fn credentials(&self) -> Credentials {
        Credentials::new(&self.username, &self.password)
    }
}

#[derive(Args, Debug, Clone)]
pub struct ConnectionArgs {
    /// Request timeout in seconds
    #[arg(long, default_value_t = 30)]
    pub timeout: u64,

    /// HTTP(S) proxy for all requests
    #[arg(long, env = "NAI_PROXY")]
    pub proxy: Option<String>,
}

impl ConnectionArgs {
    pub fn config(&self) -> ClientConfig {
        match &self.proxy {
            Some(proxy) => ClientConfig::new().proxy(proxy),
            None => ClientConfig::new(),
        }
    }

    pub fn session_options(&self) -> SessionOptions {
        SessionOptions::default().timeout(Duration::from_secs(self.timeout))
    }
}

/// Generation parameters. Unset flags keep the client defaults.
#[derive(Args, Debug, Clone)]
pub struct ParamArgs {
    /// Prompt text
    pub prompt: String,

    /// Negative prompt
    #[arg(long)]
    pub negative: Option<String>,

    #[arg(long)]
    pub model: Option<Model>,

    /// generate, img2img or infill
    #[arg(long)]
    pub action: Option<Action>,

    /// Resolution preset, e.g. normal_portrait
    #[arg(short, long)]
    pub resolution: Option<Resolution>,

    #[arg(long)]
    pub width: Option<u32>,

    #[arg(long)]
    pub height: Option<u32>,

    /// Number of images
    #[arg(short = 'n', long)]
    pub samples: Option<u32>,

    #[arg(long)]
    pub steps: Option<u32>,

    /// Prompt guidance
    #[arg(long)]
    pub scale: Option<f64>,

    #[arg(long)]
    pub sampler: Option<Sampler>,

    #[arg(long)]
    pub noise_schedule: Option<NoiseSchedule>,

    #[arg(long)]
    pub seed: Option<u64>,

    /// Negative prompt preset: 0 heavy, 1 light, 2 human focus, 3 none
    #[arg(long)]
    pub uc_preset: Option<u8>,

    /// Do not append quality tags to the prompt
    #[arg(long)]
    pub no_quality: bool,

    /// Disable SMEA
    #[arg(long)]
    pub no_smea: bool,

    /// Enable SMEA DYN
    #[arg(long)]
    pub smea_dyn: bool,

    /// Source image for img2img or infill
    #[arg(long, value_name = "FILE")]
    pub image: Option<PathBuf>,

    /// Inpainting mask
    #[arg(long, value_name = "FILE")]
    pub mask: Option<PathBuf>,

    /// img2img strength
    #[arg(long)]
    pub strength: Option<f64>,

    /// img2img noise
    #[arg(long)]
    pub noise: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_generate_command() {
        let args = vec![
            "nai",
            "generate",
            "a fox in snow",
            "--username",
            "u@example.com",
            "--password",
            "pw",
            "-r",
            "normal_portrait",
            "-n",
            "2",
            "--sampler",
            "k_dpmpp_2m",
            "--host",
            "web",
            "-o",
            "/tmp/out",
        ];
        let cli = Cli::try_parse_from(args).unwrap();

        match cli.command {
            Commands::Generate(args) => {
                assert_eq!(args.params.prompt, "a fox in snow");
                assert_eq!(args.params.resolution, Some(Resolution::NormalPortrait));
                assert_eq!(args.params.samples, Some(2));
                assert_eq!(args.params.sampler, Some(Sampler::DpmPp2m));
                assert_eq!(args.host, Host::Web);
                assert_eq!(args.output, PathBuf::from("/tmp/out"));
                assert_eq!(args.credentials.username, "u@example.com");
                assert_eq!(args.connection.timeout, 30);
                assert!(!args.opus);
            }
            _ => panic!("Expected Generate command"),
        }
    }

    #[test]
    fn parse_generate_defaults() {
        let args = vec!["nai", "gen", "cat", "--username", "u", "--password", "p"];
        let cli = Cli::try_parse_from(args).unwrap();

        match cli.command {
            Commands::Generate(args) => {
                assert_eq!(args.host, Host::Api);
                assert_eq!(args.output, PathBuf::from("output"));
                assert!(args.params.resolution.is_none());
                assert!(args.params.seed.is_none());
            }
            _ => panic!("Expected Generate command"),
        }
    }

    #[test]
    fn parse_cost_command() {
        let args = vec!["nai", "-vv", "cost", "castle", "--steps", "29", "--opus"];
        let cli = Cli::try_parse_from(args).unwrap();

        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Cost { params, opus } => {
                assert_eq!(params.steps, Some(29));
                assert!(opus);
            }
            _ => panic!("Expected Cost command"),
        }
    }

    #[test]
    fn unknown_literal_is_rejected() {
        let args = vec!["nai", "cost", "castle", "--sampler", "k_unknown"];
        assert!(Cli::try_parse_from(args).is_err());
    }

    #[test]
    fn connection_args_build_config() {
        let connection = ConnectionArgs {
            timeout: 5,
            proxy: Some("http://127.0.0.1:8080".to_string()),
        };
        assert_eq!(connection.config().proxy_url(), Some("http://127.0.0.1:8080"));
        assert_eq!(connection.session_options().timeout, Duration::from_secs(5));
    }
}
