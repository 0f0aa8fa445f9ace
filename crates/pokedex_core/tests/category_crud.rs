use chrono::NaiveDate;
use pokedex_core::db::StagedWrite;
use pokedex_core::{
    Category, CategoryRepository, Owner, OwnerRepository, Pokemon, PokemonRepository, RepoError,
    SqliteCategoryRepository, SqliteOwnerRepository, SqlitePokemonRepository, UnitOfWork,
};

#[test]
fn create_then_exists_and_listed_once() {
    let uow = UnitOfWork::open_in_memory().unwrap();
    let repo = SqliteCategoryRepository::new(&uow);

    let mut category = Category::new("Electric");
    assert!(repo.create_category(&mut category).unwrap());
    assert!(category.id > 0);

    assert!(repo.category_exists(category.id).unwrap());
    let listed = repo.get_categories().unwrap();
    assert_eq!(
        listed.iter().filter(|item| item.id == category.id).count(),
        1
    );
    assert_eq!(listed[0], category);
}

#[test]
fn get_category_distinguishes_missing_rows() {
    let uow = UnitOfWork::open_in_memory().unwrap();
    let repo = SqliteCategoryRepository::new(&uow);

    assert!(repo.get_category(42).unwrap().is_none());
    assert!(!repo.category_exists(42).unwrap());

    let mut category = Category::with_id(42, "Water");
    repo.create_category(&mut category).unwrap();
    assert_eq!(repo.get_category(42).unwrap(), Some(category));
}

#[test]
fn update_and_delete_category() {
    let uow = UnitOfWork::open_in_memory().unwrap();
    let repo = SqliteCategoryRepository::new(&uow);

    let mut category = Category::new("Fire");
    repo.create_category(&mut category).unwrap();

    category.name = "Flame".to_string();
    assert!(repo.update_category(&category).unwrap());
    assert_eq!(repo.get_category(category.id).unwrap().unwrap().name, "Flame");

    assert!(repo.delete_category(&category).unwrap());
    assert!(!repo.category_exists(category.id).unwrap());
}

#[test]
fn update_of_missing_category_reports_false() {
    let uow = UnitOfWork::open_in_memory().unwrap();
    let repo = SqliteCategoryRepository::new(&uow);

    assert!(!repo.update_category(&Category::with_id(7, "Ghost")).unwrap());
    assert!(!repo.delete_category(&Category::with_id(7, "Ghost")).unwrap());
}

#[test]
fn duplicate_names_are_accepted_by_repository() {
    let uow = UnitOfWork::open_in_memory().unwrap();
    let repo = SqliteCategoryRepository::new(&uow);

    repo.create_category(&mut Category::new("Rock")).unwrap();
    assert!(repo.create_category(&mut Category::new("Rock")).unwrap());
    assert_eq!(repo.get_categories().unwrap().len(), 2);
}

#[test]
fn save_without_pending_writes_is_false() {
    let uow = UnitOfWork::open_in_memory().unwrap();
    let repo = SqliteCategoryRepository::new(&uow);
    assert!(!repo.save().unwrap());
}

#[test]
fn pokemon_by_category_follows_join_records() {
    let uow = UnitOfWork::open_in_memory().unwrap();
    let categories = SqliteCategoryRepository::new(&uow);
    let owners = SqliteOwnerRepository::new(&uow);
    let pokemon_repo = SqlitePokemonRepository::new(&uow);

    let mut electric = Category::new("Electric");
    let mut water = Category::new("Water");
    categories.create_category(&mut electric).unwrap();
    categories.create_category(&mut water).unwrap();
    let mut ash = Owner::new("Ash", "Ketchum");
    owners.create_owner(&mut ash).unwrap();

    let mut pikachu = Pokemon::new("Pikachu", date(1996, 2, 27));
    pokemon_repo
        .create_pokemon(ash.id, electric.id, &mut pikachu)
        .unwrap();

    let listed = categories.get_pokemon_by_category(electric.id).unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, pikachu.id);
    assert!(categories
        .get_pokemon_by_category(water.id)
        .unwrap()
        .is_empty());
    assert!(categories.get_pokemon_by_category(999).unwrap().is_empty());
}

#[test]
fn delete_of_referenced_category_is_rejected_by_storage() {
    let uow = UnitOfWork::open_in_memory().unwrap();
    let categories = SqliteCategoryRepository::new(&uow);
    let owners = SqliteOwnerRepository::new(&uow);
    let pokemon_repo = SqlitePokemonRepository::new(&uow);

    let mut grass = Category::new("Grass");
    categories.create_category(&mut grass).unwrap();
    let mut misty = Owner::new("Misty", "Waterflower");
    owners.create_owner(&mut misty).unwrap();
    pokemon_repo
        .create_pokemon(
            misty.id,
            grass.id,
            &mut Pokemon::new("Oddish", date(1996, 2, 27)),
        )
        .unwrap();

    let err = categories.delete_category(&grass).unwrap_err();
    assert!(matches!(err, RepoError::Db(_)));
    assert!(categories.category_exists(grass.id).unwrap());
}

#[tokio::test(flavor = "multi_thread")]
async fn get_category_async_reads_in_memory_database() {
    let uow = UnitOfWork::open_in_memory().unwrap();
    let repo = SqliteCategoryRepository::new(&uow);

    let mut category = Category::new("Psychic");
    repo.create_category(&mut category).unwrap();

    let found = tokio::spawn(repo.get_category_async(category.id))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found, Some(category));
    assert!(repo.get_category_async(9_999).await.unwrap().is_none());
}

#[tokio::test(flavor = "multi_thread")]
async fn get_category_async_on_file_reads_committed_rows_only() {
    let dir = tempfile::tempdir().unwrap();
    let uow = UnitOfWork::open(dir.path().join("pokedex.db")).unwrap();
    let repo = SqliteCategoryRepository::new(&uow);

    let mut category = Category::new("Dragon");
    repo.create_category(&mut category).unwrap();

    uow.stage(StagedWrite::UpdateCategory(Category::with_id(
        category.id,
        "Wyvern",
    )));
    let before_save = tokio::spawn(repo.get_category_async(category.id))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(before_save, Some(category.clone()));
    assert_eq!(uow.pending_count(), 1);

    assert!(repo.save().unwrap());
    let after_save = tokio::spawn(repo.get_category_async(category.id))
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert_eq!(after_save.name, "Wyvern");
    assert!(tokio::spawn(repo.get_category_async(9_999))
        .await
        .unwrap()
        .unwrap()
        .is_none());
}

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}
