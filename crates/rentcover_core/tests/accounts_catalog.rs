use rentcover_core::db::open_db_in_memory;
use rentcover_core::{
    AccountError, AccountService, CatalogError, CatalogService, LedgerConfig, NewContractType,
    NewItem, ValidationError,
};
use rusqlite::Connection;

fn setup() -> Connection {
    open_db_in_memory().unwrap()
}

fn product(shop_type: &str) -> NewContractType {
    NewContractType {
        shop_type: shop_type.to_string(),
        formula_per_day: "price * 0.02".to_string(),
        max_sum_insured: 80_000,
        theft_insured: true,
        description: "Covers accidental damage".to_string(),
        conditions: String::new(),
        active: true,
        min_duration_days: 1,
        max_duration_days: 14,
    }
}

#[test]
fn register_and_authenticate_user() {
    let conn = setup();
    let accounts = AccountService::try_new(&conn).unwrap();

    let user = accounts
        .register_user(" Ada.L ", "analytical-engine", "Ada", "Lovelace")
        .unwrap();
    assert_eq!(user.username, "ada.l");
    assert!(user.password_hash.starts_with("$argon2id$"));
    assert!(user.contract_index.is_empty());

    assert!(accounts.authenticate("ADA.L", "analytical-engine").unwrap());
    assert!(!accounts.authenticate("ada.l", "difference-engine").unwrap());
    assert!(!accounts.authenticate("charles", "analytical-engine").unwrap());

    let profile = accounts.get_profile("ada.l").unwrap();
    assert_eq!(profile.first_name, "Ada");
    assert_eq!(profile.contract_count, 0);
    let json = serde_json::to_string(&user).unwrap();
    assert!(!json.contains("argon2"));
}

#[test]
fn duplicate_username_is_taken() {
    let conn = setup();
    let accounts = AccountService::try_new(&conn).unwrap();
    accounts
        .register_user("grace", "cobol-forever", "Grace", "Hopper")
        .unwrap();

    let err = accounts
        .register_user("GRACE", "another-secret", "Grace", "Hopper")
        .unwrap_err();
    assert!(matches!(err, AccountError::UsernameTaken(name) if name == "grace"));
}

#[test]
fn weak_password_and_bad_username_are_rejected() {
    let conn = setup();
    let accounts = AccountService::with_config(
        &conn,
        LedgerConfig {
            min_password_len: 12,
            ..LedgerConfig::default()
        },
    )
    .unwrap();

    assert!(matches!(
        accounts.register_user("linus", "short-pw", "Linus", "T"),
        Err(AccountError::WeakPassword { min_len: 12 })
    ));
    assert!(matches!(
        accounts.register_user("x", "long-enough-secret", "X", "Y"),
        Err(AccountError::Validation(ValidationError::InvalidUsername(_)))
    ));
    assert!(matches!(
        accounts.get_profile("linus"),
        Err(AccountError::NotFound(_))
    ));
}

#[test]
fn update_password_rotates_credentials() {
    let conn = setup();
    let accounts = AccountService::try_new(&conn).unwrap();
    accounts
        .register_user("barbara", "liskov-substitution", "Barbara", "Liskov")
        .unwrap();

    accounts
        .update_password("barbara", "abstract-data-types")
        .unwrap();

    assert!(!accounts
        .authenticate("barbara", "liskov-substitution")
        .unwrap());
    assert!(accounts
        .authenticate("barbara", "abstract-data-types")
        .unwrap());
    assert!(matches!(
        accounts.update_password("nobody", "abstract-data-types"),
        Err(AccountError::NotFound(_))
    ));
}

#[test]
fn contract_type_listing_filters_active_by_shop_type() {
    let conn = setup();
    let catalog = CatalogService::try_new(&conn).unwrap();
    let bikes = catalog.create_contract_type(product(" Bicycle ")).unwrap();
    let ebikes = catalog.create_contract_type(product("E-Bicycle")).unwrap();
    let skis = catalog.create_contract_type(product("Ski")).unwrap();
    assert_eq!(bikes.shop_type, "Bicycle");

    catalog.set_contract_type_active(ebikes.id, false).unwrap();

    let filtered = catalog.list_contract_types(Some("bicycle")).unwrap();
    assert_eq!(filtered, vec![bikes.clone()]);
    assert_eq!(catalog.list_contract_types(None).unwrap().len(), 3);
    assert_eq!(catalog.get_contract_type(skis.id).unwrap(), skis);
}

#[test]
fn invalid_contract_type_is_rejected() {
    let conn = setup();
    let catalog = CatalogService::try_new(&conn).unwrap();

    let err = catalog
        .create_contract_type(NewContractType {
            min_duration_days: 10,
            max_duration_days: 5,
            ..product("Ski")
        })
        .unwrap_err();
    assert!(matches!(
        err,
        CatalogError::Validation(ValidationError::DurationBounds { min: 10, max: 5 })
    ));

    let err = catalog
        .set_contract_type_active(uuid::Uuid::from_u128(7), true)
        .unwrap_err();
    assert!(matches!(err, CatalogError::NotFound { .. }));
}

#[test]
fn register_item_assigns_ids_and_validates() {
    let conn = setup();
    let catalog = CatalogService::try_new(&conn).unwrap();
    let item = NewItem {
        brand: "Atomic".to_string(),
        model: "Redster".to_string(),
        price: 64_900,
        description: "race ski".to_string(),
        serial_no: " AT-001 ".to_string(),
    };

    let first = catalog.register_item(&item).unwrap();
    let second = catalog.register_item(&item).unwrap();
    assert!(second.id > first.id);
    assert_eq!(first.serial_no, "AT-001");
    assert_eq!(catalog.get_item(first.id).unwrap(), first);

    let err = catalog
        .register_item(&NewItem {
            price: -1,
            ..item.clone()
        })
        .unwrap_err();
    assert!(matches!(
        err,
        CatalogError::Validation(ValidationError::NegativeAmount { .. })
    ));
    assert!(matches!(
        catalog.get_item(404),
        Err(CatalogError::NotFound { entity: "item", .. })
    ));
}
