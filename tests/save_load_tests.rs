#![allow(missing_docs)]
#![allow(clippy::float_cmp)]

use std::fs;
use std::path::PathBuf;

use flappy_evo::Error;
use flappy_evo::simulation::agent::Network;
use flappy_evo::simulation::brain::Brain;
use flappy_evo::simulation::champion::{CHAMPION_VERSION, Champion};
use flappy_evo::simulation::evolution::{Genome, GenomeId};
use flappy_evo::simulation::params::Params;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("flappy_evo_{}_{}.json", name, std::process::id()))
}

fn create_genome(layers: &[usize]) -> Genome {
    let mut rng = ChaCha8Rng::seed_from_u64(17);
    Genome {
        id: GenomeId(42),
        brain: Brain::new(layers, 1.0, 1.0 / 512.0, &mut rng),
        fitness: 123.4,
    }
}

#[test]
fn test_save_and_load_champion() {
    let genome = create_genome(&[3, 4, 1]);
    let champion = Champion::from_genome(7, &genome);
    let save_path = temp_path("champion");

    champion
        .save_to_file(&save_path)
        .expect("Failed to save champion");
    let loaded = Champion::load_from_file(&save_path).expect("Failed to load champion");

    assert_eq!(loaded.version, CHAMPION_VERSION);
    assert_eq!(loaded.generation, 7);
    assert_eq!(loaded.fitness, 123.4);
    assert_eq!(loaded.saved_at, champion.saved_at);
    assert!(chrono::DateTime::parse_from_rfc3339(&loaded.saved_at).is_ok());
    assert_eq!(loaded.brain.to_flat_vector(), genome.brain.to_flat_vector());

    // the replayed brain flies exactly like the trained one
    for inputs in [[244.0, -170.0, 250.0], [10.0, -200.0, 220.0], [380.0, -100.0, 320.0]] {
        assert_eq!(loaded.brain.activate(&inputs), genome.brain.activate(&inputs));
    }

    fs::remove_file(&save_path).ok();
}

#[test]
fn test_load_nonexistent_file() {
    let result = Champion::load_from_file("nonexistent_champion.json");
    assert!(matches!(result, Err(Error::Io(_))));
}

#[test]
fn test_load_invalid_json() {
    let path = temp_path("invalid");
    fs::write(&path, "{ not json").unwrap();

    let result = Champion::load_from_file(&path);
    assert!(matches!(result, Err(Error::Json(_))));

    fs::remove_file(&path).ok();
}

#[test]
fn test_load_rejects_other_version() {
    let path = temp_path("version");
    let mut champion = Champion::from_genome(0, &create_genome(&[3, 4, 1]));
    champion.version = CHAMPION_VERSION + 1;
    champion.save_to_file(&path).unwrap();

    let result = Champion::load_from_file(&path);
    assert!(matches!(
        result,
        Err(Error::IncompatibleChampion { found, expected })
            if found == CHAMPION_VERSION + 1 && expected == CHAMPION_VERSION
    ));

    fs::remove_file(&path).ok();
}

#[test]
fn test_load_rejects_wrong_shape() {
    let path = temp_path("shape");
    Champion::from_genome(0, &create_genome(&[2, 4, 1]))
        .save_to_file(&path)
        .unwrap();

    let result = Champion::load_from_file(&path);
    assert!(matches!(
        result,
        Err(Error::ChampionShape {
            inputs: 2,
            outputs: 1
        })
    ));

    fs::remove_file(&path).ok();
}

#[test]
fn test_params_round_trip() {
    let path = temp_path("params");
    let params = Params {
        pipe_gap: 120.0,
        population_size: 80,
        layer_sizes: vec![3, 8, 8, 1],
        rng_seed: Some(99),
        ..Params::default()
    };
    params.save_to_file(&path).unwrap();

    let loaded = Params::load_from_file(&path).unwrap();
    assert_eq!(loaded.pipe_gap, 120.0);
    assert_eq!(loaded.population_size, 80);
    assert_eq!(loaded.layer_sizes, vec![3, 8, 8, 1]);
    assert_eq!(loaded.rng_seed, Some(99));

    fs::remove_file(&path).ok();
}

#[test]
fn test_params_rejects_invalid_values() {
    let path = temp_path("bad_params");
    fs::write(&path, r#"{ "pipe_gap": 400.0 }"#).unwrap();

    let result = Params::load_from_file(&path);
    assert!(matches!(result, Err(Error::InvalidConfig(_))));

    fs::remove_file(&path).ok();
}
