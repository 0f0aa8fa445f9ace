//! CLI smoke entry point.
//!
//! Usage: `pokedex_cli <db-path> [log-dir]`
//!
//! Opens (and migrates) the catalog database and prints entity counts.

use pokedex_core::{
    core_version, default_log_level, init_logging, CategoryRepository, OwnerRepository,
    PokemonFetch, PokemonRepository, ReviewRepository, SqliteCategoryRepository,
    SqliteOwnerRepository, SqlitePokemonRepository, SqliteReviewRepository, UnitOfWork,
};
use std::error::Error;
use std::process::ExitCode;

fn main() -> ExitCode {
    let mut args = std::env::args().skip(1);
    let Some(db_path) = args.next() else {
        eprintln!("usage: pokedex_cli <db-path> [log-dir]");
        return ExitCode::from(2);
    };
    let log_dir = args
        .next()
        .unwrap_or_else(|| std::env::temp_dir().join("pokedex-logs").display().to_string());

    if let Err(err) = init_logging(default_log_level(), &log_dir) {
        eprintln!("logging disabled: {err}");
    }

    match print_summary(&db_path) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("event=cli_summary module=cli status=error error={err}");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn print_summary(db_path: &str) -> Result<(), Box<dyn Error>> {
    let uow = UnitOfWork::open(db_path)?;
    let categories = SqliteCategoryRepository::try_new(&uow)?.get_categories()?;
    let owners = SqliteOwnerRepository::try_new(&uow)?.get_owners()?;
    let pokemon = SqlitePokemonRepository::try_new(&uow)?.get_pokemons_with(PokemonFetch::PLAIN)?;
    let reviews = SqliteReviewRepository::try_new(&uow)?.get_reviews()?;

    println!("pokedex_core version={}", core_version());
    println!("categories={}", categories.len());
    println!("owners={}", owners.len());
    println!("pokemon={}", pokemon.len());
    println!("reviews={}", reviews.len());
    Ok(())
}
