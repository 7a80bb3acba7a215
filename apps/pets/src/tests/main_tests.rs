use super::*;

async fn memory_repo() -> (Arc<PetStore>, Arc<dyn PetRepository>) {
    let store = Arc::new(PetStore::new("sqlite::memory:").await.expect("db"));
    let repo: Arc<dyn PetRepository> = store.clone();
    (store, repo)
}

#[test]
fn parses_ids_and_item_uris() {
    assert_eq!(parse_target("12").expect("id"), PetId(12));
    assert_eq!(
        parse_target("content://com.example.android.pets/pets/5").expect("uri"),
        PetId(5)
    );
    assert!(parse_target("0").is_err());
    assert!(parse_target("content://com.example.android.pets/pets").is_err());
    assert!(parse_target("rex").is_err());
}

#[test]
fn cli_accepts_gender_labels_and_codes() {
    let cli = Cli::try_parse_from([
        "pets", "add", "--name", "Toto", "--gender", "male", "--weight", "7",
    ])
    .expect("parse");
    let Command::Add(args) = cli.command else {
        panic!("expected add");
    };
    assert_eq!(args.gender, Some(Gender::Male));

    let cli = Cli::try_parse_from(["pets", "edit", "3", "--gender", "2"]).expect("parse");
    let Command::Edit { target, fields } = cli.command else {
        panic!("expected edit");
    };
    assert_eq!(target, "3");
    assert_eq!(fields.gender, Some(Gender::Female));

    assert!(Cli::try_parse_from(["pets", "add", "--gender", "lizard"]).is_err());
}

#[test]
fn only_supplied_fields_become_edits() {
    let args = PetArgs {
        breed: Some("Pug".into()),
        weight: Some("x".into()),
        ..PetArgs::default()
    };
    assert_eq!(
        args.into_edits(),
        vec![
            FieldEdit::Breed("Pug".into()),
            FieldEdit::Weight("x".into())
        ]
    );
}

#[tokio::test]
async fn add_edit_delete_round_through_commands() {
    let (store, repo) = memory_repo().await;

    run(
        Command::Add(PetArgs {
            name: Some("Toto".into()),
            breed: Some("Terrier".into()),
            gender: Some(Gender::Male),
            weight: Some("7".into()),
        }),
        repo.clone(),
        false,
    )
    .await
    .expect("add");
    let pets = store
        .query(
            shared::domain::Selection::All,
            shared::domain::Projection::Full,
        )
        .await
        .expect("query");
    assert_eq!(pets.len(), 1);
    let id = pets[0].id;

    run(
        Command::Edit {
            target: id.0.to_string(),
            fields: PetArgs {
                weight: Some("9".into()),
                ..PetArgs::default()
            },
        },
        repo.clone(),
        false,
    )
    .await
    .expect("edit");
    assert_eq!(
        store.get(id).await.expect("get").expect("exists").fields.weight,
        9
    );

    run(Command::List, repo.clone(), true).await.expect("list");
    run(
        Command::Show {
            target: PetUri::with_appended_id(id).to_string(),
        },
        repo.clone(),
        false,
    )
    .await
    .expect("show");

    run(
        Command::Delete {
            target: id.0.to_string(),
        },
        repo.clone(),
        false,
    )
    .await
    .expect("delete");
    assert_eq!(store.count().await.expect("count"), 0);
}

#[tokio::test]
async fn blank_add_writes_nothing() {
    let (store, repo) = memory_repo().await;
    run(Command::Add(PetArgs::default()), repo, false)
        .await
        .expect("blank add");
    assert_eq!(store.count().await.expect("count"), 0);
}

#[tokio::test]
async fn seed_and_delete_all() {
    let (store, repo) = memory_repo().await;
    run(Command::Seed, repo.clone(), false).await.expect("seed");
    run(Command::Seed, repo.clone(), false).await.expect("seed");
    assert_eq!(store.count().await.expect("count"), 2);

    run(Command::DeleteAll, repo.clone(), false)
        .await
        .expect("delete all");
    assert_eq!(store.count().await.expect("count"), 0);
    run(Command::List, repo, false).await.expect("empty list");
}

#[tokio::test]
async fn editing_a_missing_pet_fails() {
    let (_store, repo) = memory_repo().await;
    let result = run(
        Command::Edit {
            target: "77".into(),
            fields: PetArgs::default(),
        },
        repo,
        false,
    )
    .await;
    assert!(result.is_err());
}
