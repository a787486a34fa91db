use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};

use rust_policy_nn::params_io::{load_params, save_params};
use rust_policy_nn::{
    Action, Dataset, ParallelAgent, PolicyAgent, PongEnv, Samples, Sequential, State,
    TrainConfig, policy_network,
};

/// Train and play a Pong paddle policy.
#[derive(Parser)]
#[command(name = "policy-nn", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Label samples with the heuristic policy and fit a network to them.
    Train(TrainArgs),
    /// Play episodes with a trained policy.
    Play(PlayArgs),
}

#[derive(Args)]
struct TrainArgs {
    /// CSV of `ball_x,ball_y,paddle_y` rows.
    input: PathBuf,

    /// Where to write the `epoch,reward,precision` history.
    #[arg(long, default_value = "output.csv")]
    output: PathBuf,

    /// Where to write the trained parameters, one per line.
    #[arg(long, default_value = "trained_params.txt")]
    params: PathBuf,

    #[command(flatten)]
    model: ModelArgs,

    #[arg(long)]
    epochs: Option<usize>,

    #[arg(long)]
    lr: Option<f32>,

    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Args)]
struct PlayArgs {
    #[arg(long, default_value = "trained_params.txt")]
    params: PathBuf,

    #[command(flatten)]
    model: ModelArgs,

    #[arg(long, default_value_t = 5)]
    episodes: usize,

    /// Step limit per episode.
    #[arg(long, default_value_t = 1000)]
    max_steps: usize,

    /// Environment seed.
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Evaluate the policy on a pool of this many workers; `0` runs inline.
    #[arg(long, default_value_t = 0)]
    workers: usize,
}

#[derive(Args)]
struct ModelArgs {
    /// JSON training config; flags given on the command line take precedence.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Hidden layer widths, e.g. `64,32`.
    #[arg(long, value_delimiter = ',')]
    hidden: Option<Vec<usize>>,
}

impl ModelArgs {
    fn load(&self) -> Result<TrainConfig> {
        let mut cfg = match &self.config {
            Some(path) => TrainConfig::load_json(path)
                .with_context(|| format!("Failed to load config: {}", path.display()))?,
            None => TrainConfig::default(),
        };
        if let Some(hidden) = &self.hidden {
            cfg.hidden = hidden.clone();
        }
        Ok(cfg)
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    match cli.command {
        Command::Train(args) => train(args),
        Command::Play(args) => play(args),
    }
}

fn train(args: TrainArgs) -> Result<()> {
    let mut cfg = args.model.load()?;
    if let Some(epochs) = args.epochs {
        cfg.epochs = epochs;
    }
    if let Some(lr) = args.lr {
        cfg.lr = lr;
    }
    if let Some(seed) = args.seed {
        cfg.seed = seed;
    }
    cfg.validate().context("Invalid training config")?;

    let (samples, report) = Samples::load_csv(&args.input)
        .with_context(|| format!("Failed to load samples: {}", args.input.display()))?;
    println!(
        "Loaded {} samples ({} rows rejected)",
        report.accepted, report.rejected
    );

    let data = Dataset::labeled(&samples)?;
    let mut net = policy_network(&cfg.hidden, cfg.init, cfg.seed)
        .context("Failed to build policy network")?;
    let fit = net.fit(&data, &cfg).context("Training failed")?;

    for r in &fit.history {
        println!(
            "Epoch {} | Reward: {:.4} | Precision: {:.2}%",
            r.epoch, r.reward, r.accuracy
        );
    }
    println!(
        "Final loss {:.6}, precision {:.2}%, pruned {} parameters",
        fit.final_loss, fit.final_accuracy, fit.pruned
    );

    fit.save_csv(&args.output)
        .with_context(|| format!("Failed to write history: {}", args.output.display()))?;
    save_params(&net, &args.params)
        .with_context(|| format!("Failed to save parameters: {}", args.params.display()))?;
    println!(
        "Wrote {} and {}",
        args.output.display(),
        args.params.display()
    );
    Ok(())
}

fn play(args: PlayArgs) -> Result<()> {
    let cfg = args.model.load()?;
    let mut net = policy_network(&cfg.hidden, cfg.init, cfg.seed)?;
    load_params(&mut net, &args.params).with_context(|| {
        format!(
            "Failed to load parameters from {} (hidden layers {:?})",
            args.params.display(),
            cfg.hidden
        )
    })?;
    let model = Sequential::from_layers(net.into_layers());

    let mut env = PongEnv::with_seed(args.seed);
    let mut total = 0.0;

    if args.workers > 0 {
        let mut agent = ParallelAgent::new(model, args.workers)?;
        for episode in 0..args.episodes {
            let reward = run_episode(&mut env, args.max_steps, |s| {
                Ok(agent.act_async(*s)?.join()??)
            })?;
            println!("Episode {episode}: reward {reward}");
            total += reward;
        }
        agent.shutdown();
    } else {
        let agent = PolicyAgent::new(model);
        for episode in 0..args.episodes {
            let reward = run_episode(&mut env, args.max_steps, |s| Ok(agent.act(s)?))?;
            println!("Episode {episode}: reward {reward}");
            total += reward;
        }
    }

    println!("Total reward over {} episodes: {total}", args.episodes);
    Ok(())
}

fn run_episode<F>(env: &mut PongEnv, max_steps: usize, mut policy: F) -> Result<f32>
where
    F: FnMut(&State) -> Result<Action>,
{
    if max_steps == 0 {
        bail!("--max-steps must be > 0");
    }
    let mut state = env.reset();
    let mut total = 0.0;
    for _ in 0..max_steps {
        let step = env.step(policy(&state)?);
        total += step.reward;
        state = step.state;
        if step.done {
            break;
        }
    }
    Ok(total)
}
