use chrono::NaiveDate;
use pokedex_core::{
    Category, CategoryRepository, EntityKind, Owner, OwnerRepository, Pokemon, PokemonFetch,
    PokemonRepository, RepoError, Review, ReviewRepository, SqliteCategoryRepository,
    SqliteOwnerRepository, SqlitePokemonRepository, SqliteReviewRepository, UnitOfWork,
};
use rust_decimal::Decimal;

struct Fixture {
    uow: UnitOfWork,
    owner_id: i64,
    category_id: i64,
}

impl Fixture {
    fn new() -> Self {
        let uow = UnitOfWork::open_in_memory().unwrap();
        let mut owner = Owner::new("Ash", "Ketchum").with_gym("Pallet");
        SqliteOwnerRepository::new(&uow)
            .create_owner(&mut owner)
            .unwrap();
        let mut category = Category::new("Electric");
        SqliteCategoryRepository::new(&uow)
            .create_category(&mut category)
            .unwrap();
        Self {
            uow,
            owner_id: owner.id,
            category_id: category.id,
        }
    }

    fn add_pokemon(&self, pokemon: Pokemon) -> Pokemon {
        let mut pokemon = pokemon;
        let created = SqlitePokemonRepository::new(&self.uow)
            .create_pokemon(self.owner_id, self.category_id, &mut pokemon)
            .unwrap();
        assert!(created);
        pokemon
    }

    fn add_review(&self, pokemon_id: i64, rating: i32) {
        let mut review = Review::new(pokemon_id, "review", "text", rating);
        SqliteReviewRepository::new(&self.uow)
            .create_review(&mut review)
            .unwrap();
    }
}

#[test]
fn create_pokemon_links_owner_and_category() {
    let fixture = Fixture::new();
    let pikachu = fixture.add_pokemon(Pokemon::new("Pikachu", date(1996, 2, 27)));
    assert!(pikachu.id > 0);

    let categories = SqliteCategoryRepository::new(&fixture.uow);
    let listed = categories
        .get_pokemon_by_category(fixture.category_id)
        .unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].name, "Pikachu");

    let owners = SqliteOwnerRepository::new(&fixture.uow);
    let owner = owners.get_owner_of_pokemon(pikachu.id).unwrap().unwrap();
    assert_eq!(owner.id, fixture.owner_id);
}

#[test]
fn get_pokemon_eager_loads_categories() {
    let fixture = Fixture::new();
    let created = fixture.add_pokemon(Pokemon::new("Pikachu", date(1996, 2, 27)));
    let repo = SqlitePokemonRepository::new(&fixture.uow);

    let loaded = repo.get_pokemon(created.id).unwrap().unwrap();
    assert_eq!(loaded.name, created.name);
    assert_eq!(loaded.birth_date, created.birth_date);
    let categories = loaded.categories.expect("categories should be loaded");
    assert_eq!(categories.len(), 1);
    assert_eq!(categories[0].id, fixture.category_id);
    assert_eq!(categories[0].name, "Electric");

    let plain = repo
        .get_pokemon_with(created.id, PokemonFetch::PLAIN)
        .unwrap()
        .unwrap();
    assert!(!plain.categories_loaded());
}

#[test]
fn get_pokemon_returns_none_for_missing_id() {
    let fixture = Fixture::new();
    let repo = SqlitePokemonRepository::new(&fixture.uow);
    assert!(repo.get_pokemon(404).unwrap().is_none());
    assert!(!repo.pokemon_exists(404).unwrap());
}

#[test]
fn create_pokemon_with_missing_references_writes_nothing() {
    let fixture = Fixture::new();
    let repo = SqlitePokemonRepository::new(&fixture.uow);

    let mut missing_owner = Pokemon::new("Eevee", date(1996, 2, 27));
    let err = repo
        .create_pokemon(999, fixture.category_id, &mut missing_owner)
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::ReferenceNotFound {
            kind: EntityKind::Owner,
            id: 999
        }
    ));

    let mut missing_category = Pokemon::new("Eevee", date(1996, 2, 27));
    let err = repo
        .create_pokemon(fixture.owner_id, 999, &mut missing_category)
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::ReferenceNotFound {
            kind: EntityKind::Category,
            id: 999
        }
    ));

    assert!(repo.get_pokemons().unwrap().is_empty());
    assert_eq!(fixture.uow.pending_count(), 0);
}

#[test]
fn get_pokemon_by_name_matches_exactly_and_returns_first() {
    let fixture = Fixture::new();
    let first = fixture.add_pokemon(Pokemon::with_id(5, "Ditto", date(1996, 2, 27)));
    fixture.add_pokemon(Pokemon::with_id(9, "Ditto", date(1997, 1, 1)));
    let repo = SqlitePokemonRepository::new(&fixture.uow);

    let found = repo.get_pokemon_by_name("Ditto").unwrap().unwrap();
    assert_eq!(found.id, first.id);
    assert!(repo.get_pokemon_by_name("ditto").unwrap().is_none());
}

#[test]
fn get_pokemons_orders_by_id_regardless_of_insertion_order() {
    let fixture = Fixture::new();
    for (id, name) in [(30, "Gengar"), (10, "Bulbasaur"), (20, "Charmander")] {
        fixture.add_pokemon(Pokemon::with_id(id, name, date(1996, 2, 27)));
    }
    let repo = SqlitePokemonRepository::new(&fixture.uow);

    let listed = repo.get_pokemons().unwrap();
    let ids: Vec<i64> = listed.iter().map(|pokemon| pokemon.id).collect();
    assert_eq!(ids, vec![10, 20, 30]);
    assert!(listed.iter().all(|pokemon| pokemon.categories_loaded()));
}

#[test]
fn rating_is_zero_without_reviews() {
    let fixture = Fixture::new();
    let pokemon = fixture.add_pokemon(Pokemon::new("Snorlax", date(1996, 2, 27)));
    let repo = SqlitePokemonRepository::new(&fixture.uow);

    assert_eq!(repo.get_pokemon_rating(pokemon.id).unwrap(), Decimal::ZERO);
}

#[test]
fn rating_is_decimal_mean_of_reviews() {
    let fixture = Fixture::new();
    let whole = fixture.add_pokemon(Pokemon::new("Mew", date(1996, 2, 27)));
    let fractional = fixture.add_pokemon(Pokemon::new("Mewtwo", date(1996, 2, 27)));
    for rating in [3, 4, 5] {
        fixture.add_review(whole.id, rating);
    }
    for rating in [1, 2] {
        fixture.add_review(fractional.id, rating);
    }
    let repo = SqlitePokemonRepository::new(&fixture.uow);

    assert_eq!(repo.get_pokemon_rating(whole.id).unwrap(), Decimal::from(4));
    assert_eq!(
        repo.get_pokemon_rating(fractional.id).unwrap(),
        Decimal::new(15, 1)
    );
}

#[test]
fn delete_pokemon_without_reviews_cascades_join_records() {
    let fixture = Fixture::new();
    let pokemon = fixture.add_pokemon(Pokemon::new("Magikarp", date(1996, 2, 27)));
    let repo = SqlitePokemonRepository::new(&fixture.uow);

    assert!(repo.delete_pokemon(&pokemon).unwrap());
    assert!(!repo.pokemon_exists(pokemon.id).unwrap());

    let remaining_joins: i64 = fixture
        .uow
        .connection()
        .query_row(
            "SELECT
                (SELECT COUNT(*) FROM pokemon_categories)
              + (SELECT COUNT(*) FROM pokemon_owners);",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(remaining_joins, 0);
}

#[test]
fn delete_pokemon_with_reviews_is_rejected_until_reviews_are_gone() {
    let fixture = Fixture::new();
    let pokemon = fixture.add_pokemon(Pokemon::new("Psyduck", date(1996, 2, 27)));
    fixture.add_review(pokemon.id, 2);
    let repo = SqlitePokemonRepository::new(&fixture.uow);
    let reviews = SqliteReviewRepository::new(&fixture.uow);

    assert!(matches!(
        repo.delete_pokemon(&pokemon).unwrap_err(),
        RepoError::Db(_)
    ));
    assert!(repo.pokemon_exists(pokemon.id).unwrap());

    let pending = reviews.get_reviews_of_a_pokemon(pokemon.id).unwrap();
    assert!(reviews.delete_reviews(&pending).unwrap());
    assert!(repo.delete_pokemon(&pokemon).unwrap());
}

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}
