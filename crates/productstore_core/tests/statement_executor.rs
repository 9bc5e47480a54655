use productstore_core::{
    CardinalityError, Command, DataAccessError, Product, SqlExecutor, SqliteUnitOfWork,
    StoreConfig, UnitOfWork,
};
use std::time::Duration;

fn seeded_executor(uow: &SqliteUnitOfWork, names: &[&str]) -> SqlExecutor {
    let executor = uow.executor().unwrap();
    for (offset, name) in names.iter().enumerate() {
        executor
            .execute(
                &Command::new("INSERT INTO products (name, price) VALUES (:name, :price);")
                    .param("name", name.to_string())
                    .param("price", offset as f64 + 1.0),
            )
            .unwrap();
    }
    executor
}

fn products_named(name: &str) -> Command {
    Command::new("SELECT id, name, price FROM products WHERE name = @name ORDER BY id;")
        .param("@name", name.to_string())
}

#[test]
fn single_requires_exactly_one_row() {
    let uow = SqliteUnitOfWork::open(&StoreConfig::in_memory()).unwrap();
    let executor = seeded_executor(&uow, &["Widget", "Gadget", "Gadget"]);

    let widget: Product = executor.query_single(&products_named("Widget")).unwrap();
    assert_eq!(widget.name, "Widget");

    assert!(matches!(
        executor.query_single::<Product>(&products_named("Nothing")),
        Err(DataAccessError::Cardinality(CardinalityError::NoRows))
    ));
    assert!(matches!(
        executor.query_single::<Product>(&products_named("Gadget")),
        Err(DataAccessError::Cardinality(CardinalityError::MultipleRows))
    ));
}

#[test]
fn optional_allows_zero_but_not_many() {
    let uow = SqliteUnitOfWork::open(&StoreConfig::in_memory()).unwrap();
    let executor = seeded_executor(&uow, &["Widget", "Gadget", "Gadget"]);

    assert!(executor
        .query_optional::<Product>(&products_named("Nothing"))
        .unwrap()
        .is_none());
    assert!(executor
        .query_optional::<Product>(&products_named("Widget"))
        .unwrap()
        .is_some());
    assert!(matches!(
        executor.query_optional::<Product>(&products_named("Gadget")),
        Err(DataAccessError::Cardinality(CardinalityError::MultipleRows))
    ));
}

#[test]
fn first_takes_leading_row_of_many() {
    let uow = SqliteUnitOfWork::open(&StoreConfig::in_memory()).unwrap();
    let executor = seeded_executor(&uow, &["Widget", "Gadget", "Gadget"]);

    let first: Product = executor.query_first(&products_named("Gadget")).unwrap();
    assert_eq!(first.id, 2);

    assert!(matches!(
        executor.query_first::<Product>(&products_named("Nothing")),
        Err(DataAccessError::Cardinality(CardinalityError::NoRows))
    ));
    assert!(executor
        .query_first_optional::<Product>(&products_named("Nothing"))
        .unwrap()
        .is_none());
}

#[test]
fn multi_row_query_and_scalars() {
    let uow = SqliteUnitOfWork::open(&StoreConfig::in_memory()).unwrap();
    let executor = seeded_executor(&uow, &["Widget", "Gadget"]);

    let names: Vec<String> = executor
        .query(&Command::new("SELECT name FROM products ORDER BY name;"))
        .unwrap();
    assert_eq!(names, ["Gadget", "Widget"]);

    let total: Option<f64> = executor
        .execute_scalar(&Command::new("SELECT sum(price) FROM products;"))
        .unwrap();
    assert_eq!(total, Some(3.0));

    let none: Option<i64> = executor
        .execute_scalar(&Command::new("SELECT id FROM products WHERE id < 0;"))
        .unwrap();
    assert_eq!(none, None);
}

#[test]
fn unused_parameters_are_ignored() {
    let uow = SqliteUnitOfWork::open(&StoreConfig::in_memory()).unwrap();
    let executor = seeded_executor(&uow, &["Widget"]);

    let count: i64 = executor
        .query_single(
            &Command::new("SELECT count(*) FROM products WHERE price > $min;")
                .param("$min", 0.5)
                .param("unused", 7_i64),
        )
        .unwrap();
    assert_eq!(count, 1);
}

#[test]
fn table_direct_selects_whole_table() {
    let uow = SqliteUnitOfWork::open(&StoreConfig::in_memory()).unwrap();
    let executor = seeded_executor(&uow, &["Widget", "Gadget"]);

    let all: Vec<Product> = executor.query(&Command::table("products")).unwrap();
    assert_eq!(all.len(), 2);

    let err = executor
        .query::<Product>(&Command::table("products WHERE 1=1"))
        .unwrap_err();
    assert!(matches!(err, DataAccessError::InvalidStatement(_)));
}

#[test]
fn timed_out_read_leaves_transaction_usable() {
    let uow = SqliteUnitOfWork::open(&StoreConfig::in_memory()).unwrap();
    let executor = uow.executor().unwrap();

    let endless = Command::new(
        "WITH RECURSIVE counter(x) AS (SELECT 1 UNION ALL SELECT x + 1 FROM counter)
         SELECT count(*) FROM counter;",
    )
    .timeout(Duration::from_millis(50));
    let err = executor.query_single::<i64>(&endless).unwrap_err();
    assert!(matches!(err, DataAccessError::Timeout));

    let one: i64 = executor.query_single(&Command::new("SELECT 1;")).unwrap();
    assert_eq!(one, 1);
}

#[test]
fn grid_reader_walks_result_sets_in_order() {
    let uow = SqliteUnitOfWork::open(&StoreConfig::in_memory()).unwrap();
    let executor = seeded_executor(&uow, &["Gadget"]);

    let batch = Command::new(
        "INSERT INTO products (name, price) VALUES (:name, :price);
         SELECT count(*) FROM products;
         SELECT id, name, price FROM products WHERE name = :name;
         SELECT id, name, price FROM products WHERE id < 0;",
    )
    .param("name", "Widget".to_string())
    .param("price", 9.99);

    let mut grid = executor.query_multiple(&batch).unwrap();
    assert_eq!(grid.read_single::<i64>().unwrap(), 2);

    let widget: Product = grid.read_single().unwrap();
    assert_eq!(widget.name, "Widget");
    assert_eq!(widget.price, 9.99);

    assert!(grid.read_optional::<Product>().unwrap().is_none());
    assert!(!grid.is_consumed());

    assert!(matches!(
        grid.read::<Product>(),
        Err(DataAccessError::ResultSetsExhausted)
    ));
    assert!(grid.is_consumed());
    assert!(matches!(
        grid.read_first::<Product>(),
        Err(DataAccessError::ResultSetsExhausted)
    ));
}

#[test]
fn executor_from_finished_transaction_is_stale() {
    let mut uow = SqliteUnitOfWork::open(&StoreConfig::in_memory()).unwrap();
    let executor = uow.executor().unwrap();
    uow.rollback().unwrap();

    assert!(matches!(
        executor.execute(&Command::new("SELECT 1;")),
        Err(DataAccessError::StaleTransaction)
    ));
}

fn ghost_batch() -> Command {
    Command::new(
        "SELECT 1;
         INSERT INTO products (name, price) VALUES ('Ghost', 1.0);
         SELECT count(*) FROM products;",
    )
}

#[test]
fn grid_reader_stops_after_commit() {
    let mut uow = SqliteUnitOfWork::open(&StoreConfig::in_memory()).unwrap();
    let executor = uow.executor().unwrap();
    let batch = ghost_batch();
    let mut grid = executor.query_multiple(&batch).unwrap();
    assert_eq!(grid.read_single::<i64>().unwrap(), 1);

    assert!(uow.commit().unwrap().is_committed());

    assert!(matches!(
        grid.read_single::<i64>(),
        Err(DataAccessError::StaleTransaction)
    ));
    let count: i64 = uow
        .executor()
        .unwrap()
        .query_single(&Command::new("SELECT count(*) FROM products;"))
        .unwrap();
    assert_eq!(count, 0);
}

#[test]
fn grid_reader_stops_after_dispose() {
    let mut uow = SqliteUnitOfWork::open(&StoreConfig::in_memory()).unwrap();
    let executor = uow.executor().unwrap();
    let batch = ghost_batch();
    let mut grid = executor.query_multiple(&batch).unwrap();
    assert_eq!(grid.read_single::<i64>().unwrap(), 1);

    uow.dispose();

    assert!(matches!(
        grid.read_single::<i64>(),
        Err(DataAccessError::Disposed)
    ));
}

#[test]
fn idle_grid_reader_deadline_does_not_interrupt_other_statements() {
    let mut uow = SqliteUnitOfWork::open(&StoreConfig::in_memory()).unwrap();
    let executor = uow.executor().unwrap();
    let batch = Command::new("SELECT 1; SELECT 2;").timeout(Duration::from_millis(20));
    let mut grid = executor.query_multiple(&batch).unwrap();
    assert_eq!(grid.read_single::<i64>().unwrap(), 1);

    std::thread::sleep(Duration::from_millis(60));

    let counted: i64 = executor
        .query_single(&Command::new(
            "WITH RECURSIVE counter(x) AS (
                 SELECT 1 UNION ALL SELECT x + 1 FROM counter WHERE x < 100000
             )
             SELECT count(*) FROM counter;",
        ))
        .unwrap();
    assert_eq!(counted, 100_000);
    assert!(uow.commit().unwrap().is_committed());
    assert!(matches!(
        grid.read_single::<i64>(),
        Err(DataAccessError::StaleTransaction)
    ));
}
