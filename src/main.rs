use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use flappy_evo::simulation::agent::Controller;
use flappy_evo::simulation::champion::Champion;
use flappy_evo::simulation::evolution::{Genome, GenomeId, Population};
use flappy_evo::simulation::harness::{Episode, Phase, Trainer};
use flappy_evo::simulation::params::Params;
use flappy_evo::simulation::sprites::SpriteSet;
use macroquad::input::{KeyCode, is_key_pressed};
use macroquad::time::get_frame_time;
use macroquad::window::{Conf, clear_background, next_frame};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{info, warn};

mod graphics;
mod ui;

/// Upper bound on simulation ticks per rendered frame.
const MAX_TICKS_PER_FRAME: u32 = 2_000;

#[derive(Parser, Debug)]
#[command(name = "flappy-evo", version, about = "Flappy Bird with neuroevolved players")]
struct Cli {
    /// JSON parameter file; missing fields take their defaults.
    #[arg(long, global = true, env = "FLAPPY_EVO_CONFIG")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Evolve a population and save the champion.
    Train {
        /// Number of generations (overrides the config).
        #[arg(long)]
        generations: Option<u32>,
        /// Show every episode in a window.
        #[arg(long)]
        watch: bool,
        /// Seed for pipes and genomes.
        #[arg(long)]
        seed: Option<u64>,
        /// Where to write the champion.
        #[arg(long, default_value = "champion.json")]
        out: PathBuf,
    },
    /// Watch a saved champion fly.
    Replay {
        /// Champion file written by `train`.
        #[arg(long, default_value = "champion.json")]
        champion: PathBuf,
        /// Seed for the pipe course.
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Play with the keyboard (space or up arrow to flap).
    Play {
        /// Seed for the pipe course.
        #[arg(long)]
        seed: Option<u64>,
    },
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let mut params = match &cli.config {
        Some(path) => Params::load_from_file(path)
            .with_context(|| format!("loading parameters from {}", path.display()))?,
        None => Params::default(),
    };

    match cli.command {
        Command::Train {
            generations,
            watch,
            seed,
            out,
        } => {
            if seed.is_some() {
                params.rng_seed = seed;
            }
            params.validate()?;
            let generations = generations.unwrap_or(params.generations);
            if watch {
                let app = App::training(params, generations, out);
                run_window("Flappy Evo - training", app);
                Ok(())
            } else {
                train_headless(params, generations, &out)
            }
        }
        Command::Replay { champion, seed } => {
            let champion = Champion::load_from_file(&champion)
                .with_context(|| format!("loading champion from {}", champion.display()))?;
            info!(
                generation = champion.generation,
                fitness = champion.fitness,
                saved_at = %champion.saved_at,
                "replaying champion"
            );
            run_window("Flappy Evo - replay", App::replay(params, champion, seed));
            Ok(())
        }
        Command::Play { seed } => {
            run_window("Flappy Evo", App::play(params, seed));
            Ok(())
        }
    }
}

/// Pipe courses and genomes draw from separate streams of one seed.
fn seeds(params: &Params) -> (ChaCha8Rng, Option<u64>) {
    match params.rng_seed {
        Some(seed) => (ChaCha8Rng::seed_from_u64(seed), Some(seed.wrapping_add(1))),
        None => (ChaCha8Rng::from_os_rng(), None),
    }
}

fn train_headless(params: Params, generations: u32, out: &Path) -> Result<()> {
    let (mut rng, course_seed) = seeds(&params);
    let sprites = Arc::new(SpriteSet::classic());
    let mut trainer = Trainer::new(params.clone(), sprites, course_seed);
    let mut population = Population::new(&params, &mut rng);

    info!(
        population = params.population_size,
        generations,
        layers = ?params.layer_sizes,
        "training started"
    );
    population.run(&params, &mut rng, generations, |generation, genomes| {
        trainer.evaluate(generation, genomes);
    });

    let Some((generation, genome)) = population.champion() else {
        bail!("no generation was evaluated");
    };
    Champion::from_genome(generation, genome)
        .save_to_file(out)
        .with_context(|| format!("saving champion to {}", out.display()))?;
    Ok(())
}

fn run_window(title: &str, app: App) {
    let conf = Conf {
        window_title: title.to_owned(),
        window_width: 288 * 2 + 260,
        window_height: 512 * 2,
        window_resizable: false,
        ..Default::default()
    };
    macroquad::Window::from_config(conf, app.run());
}

/// Windowed modes.
enum Mode {
    Play,
    Replay { champion: Genome },
    Train {
        population: Population,
        rng: ChaCha8Rng,
        generations: u32,
        out: PathBuf,
        finished: bool,
    },
}

struct App {
    trainer: Trainer,
    mode: Mode,
    episode: Episode,
    ui: ui::UIState,
    accumulator: f32,
}

impl App {
    fn new(params: Params, course_seed: Option<u64>, mode: Mode) -> Self {
        let mut trainer = Trainer::new(params, Arc::new(SpriteSet::classic()), course_seed);
        let episode = start_episode(&mut trainer, &mode);
        Self {
            trainer,
            mode,
            episode,
            ui: ui::UIState::new(),
            accumulator: 0.0,
        }
    }

    fn play(params: Params, seed: Option<u64>) -> Self {
        Self::new(params, seed, Mode::Play)
    }

    fn replay(params: Params, champion: Champion, seed: Option<u64>) -> Self {
        let genome = Genome {
            id: GenomeId(0),
            brain: champion.brain,
            fitness: champion.fitness,
        };
        Self::new(params, seed, Mode::Replay { champion: genome })
    }

    fn training(params: Params, generations: u32, out: PathBuf) -> Self {
        let (mut rng, course_seed) = seeds(&params);
        let population = Population::new(&params, &mut rng);
        let mode = Mode::Train {
            population,
            rng,
            generations,
            out,
            finished: false,
        };
        Self::new(params, course_seed, mode)
    }

    async fn run(mut self) {
        loop {
            self.handle_input();

            let interval = self.trainer.state().params().tick_interval();
            self.accumulator += get_frame_time() * self.ui.simulation_speed;
            let mut ticks = 0;
            while self.accumulator >= interval && ticks < MAX_TICKS_PER_FRAME {
                self.accumulator -= interval;
                ticks += 1;
                self.advance();
            }
            if ticks == MAX_TICKS_PER_FRAME {
                self.accumulator = 0.0;
            }

            clear_background(macroquad::color::LIGHTGRAY);
            let state = self.trainer.state();
            if self.ui.rendering_enabled {
                graphics::draw_scene(state);
            }
            if matches!(self.mode, Mode::Play) && self.episode.phase() == Phase::Terminal {
                graphics::draw_message("Game over - press space", state.params());
            }

            let hud = self.hud();
            ui::draw_ui(&mut self.ui, self.trainer.state(), &hud);
            ui::process_egui();

            next_frame().await;
        }
    }

    fn handle_input(&mut self) {
        if !matches!(self.mode, Mode::Play) {
            return;
        }
        if !(is_key_pressed(KeyCode::Space) || is_key_pressed(KeyCode::Up)) {
            return;
        }
        if self.episode.phase() == Phase::Terminal {
            self.trainer.finish(&self.episode);
            self.episode = start_episode(&mut self.trainer, &self.mode);
            return;
        }
        let bird = self.trainer.state().birds().next().map(|bird| bird.id);
        if let Some(bird) = bird {
            self.trainer.state_mut().request_flap(bird);
        }
    }

    /// One fixed-timestep tick.
    fn advance(&mut self) {
        if self.trainer.tick(&mut self.episode) == Phase::Running {
            return;
        }

        if matches!(self.mode, Mode::Replay { .. }) {
            let summary = self.trainer.finish(&self.episode);
            self.ui.status_message = Some(format!("Last run: score {}", summary.best_score));
            self.episode = start_episode(&mut self.trainer, &self.mode);
            return;
        }

        let Mode::Train {
            population,
            rng,
            generations,
            out,
            finished,
        } = &mut self.mode
        else {
            return;
        };
        if *finished {
            return;
        }

        let params = self.trainer.state().params().clone();
        self.trainer.finish(&self.episode);
        let episode = &self.episode;
        let stats = population.evaluate(|_, genomes| episode.apply(genomes));
        self.ui.record_generation(&stats);

        let threshold_reached = params.fitness_threshold.is_some_and(|t| stats.best >= t);
        if threshold_reached || population.generation() + 1 >= *generations {
            *finished = true;
            self.ui.status_message = Some(save_champion(population, out));
            return;
        }
        population.evolve(&params, rng);
        self.episode = self.trainer.begin(population.generation(), population.genomes());
    }

    fn hud(&self) -> ui::Hud<'static> {
        match &self.mode {
            Mode::Play => ui::Hud {
                title: "Play",
                generation: None,
                fitness: None,
            },
            Mode::Replay { champion } => ui::Hud {
                title: "Replay",
                generation: None,
                fitness: Some(champion.fitness),
            },
            Mode::Train { population, .. } => ui::Hud {
                title: "Training",
                generation: Some(population.generation()),
                fitness: Some(self.episode.running_fitness()),
            },
        }
    }
}

fn start_episode(trainer: &mut Trainer, mode: &Mode) -> Episode {
    match mode {
        Mode::Play => trainer.begin_cohort(0, [(GenomeId(0), Controller::keyboard())]),
        Mode::Replay { champion } => trainer.begin(0, std::slice::from_ref(champion)),
        Mode::Train { population, .. } => {
            trainer.begin(population.generation(), population.genomes())
        }
    }
}

fn save_champion(population: &Population, out: &Path) -> String {
    let Some((generation, genome)) = population.champion() else {
        return "No champion to save".to_owned();
    };
    match Champion::from_genome(generation, genome).save_to_file(out) {
        Ok(()) => format!("Champion saved to {}", out.display()),
        Err(err) => {
            warn!(error = %err, "saving champion failed");
            format!("Saving champion failed: {}", err)
        }
    }
}
