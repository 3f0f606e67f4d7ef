mod common;

use bson::Bson;
use doclink::{memory::InMemoryStore, prelude::*};

use common::{Team, User, gateway, name, names};

#[tokio::test]
async fn create_then_find_by_id_round_trips() {
    let gateway = gateway(InMemoryStore::new());

    let created = gateway
        .create::<User>(Fields::new().set("name", "A").set("age", 41))
        .await
        .unwrap();

    assert!(!created.id().is_empty());
    assert_eq!(created.class(), "User");

    let found = gateway
        .find_by_id::<User>(created.id())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(found, created);
    assert_eq!(found.get_as::<i32>("age").unwrap(), Some(41));
}

#[tokio::test]
async fn references_come_back_as_handles_from_find_by_id() {
    let gateway = gateway(InMemoryStore::new());

    let alice = gateway
        .create::<User>(Fields::new().set("name", "A"))
        .await
        .unwrap();
    let bob = gateway
        .create::<User>(Fields::new().set("name", "B").reference("manager", &alice))
        .await
        .unwrap();

    assert_eq!(bob.reference_to("manager"), Some(&Reference::new(alice.id(), "User")));

    let found = gateway
        .find_by_id::<User>(bob.id())
        .await
        .unwrap()
        .unwrap();

    assert!(found.get("manager").unwrap().is_unhydrated());
    assert_eq!(found.reference_to("manager").unwrap().id(), alice.id());
}

#[tokio::test]
async fn find_by_id_of_missing_document_is_none() {
    let gateway = gateway(InMemoryStore::new());

    assert!(gateway.find_by_id::<User>("nope").await.unwrap().is_none());
}

#[tokio::test]
async fn unknown_field_is_rejected_and_nothing_is_stored() {
    let store = InMemoryStore::new();
    let gateway = gateway(store.clone());

    let err = gateway
        .create::<User>(Fields::new().set("name", "A").set("email", "a@example.com"))
        .await
        .unwrap_err();

    assert_eq!(
        err.to_string(),
        "You are trying to create unknown field \"email\" in \"User\""
    );
    assert_eq!(store.count("users").await, 0);
}

#[tokio::test]
async fn reference_fields_accept_raw_identities_but_not_foreign_classes() {
    let gateway = gateway(InMemoryStore::new());

    let team = gateway
        .create::<Team>(Fields::new().set("title", "Core"))
        .await
        .unwrap();

    let err = gateway
        .create::<User>(Fields::new().reference("manager", &team))
        .await
        .unwrap_err();
    assert!(matches!(err, DocLinkError::InvalidReference { field, .. } if field == "manager"));

    let user = gateway
        .create::<User>(Fields::new().set("team", team.id()))
        .await
        .unwrap();
    assert_eq!(user.reference_to("team"), Some(&Reference::new(team.id(), "Team")));
}

#[tokio::test]
async fn all_returns_every_document_in_insertion_order_without_hydration() {
    let gateway = gateway(InMemoryStore::new());

    let alice = gateway
        .create::<User>(Fields::new().set("name", "A"))
        .await
        .unwrap();
    gateway
        .create::<User>(Fields::new().set("name", "B").reference("manager", &alice))
        .await
        .unwrap();
    gateway
        .create::<User>(Fields::new().set("name", "C"))
        .await
        .unwrap();

    let users = gateway.all::<User>().await.unwrap();

    assert_eq!(names(&users), vec!["A", "B", "C"]);
    assert!(users[1].get("manager").unwrap().is_unhydrated());
    assert!(gateway.all::<Team>().await.unwrap().is_empty());
}

#[tokio::test]
async fn update_merges_and_delete_removes() {
    let gateway = gateway(InMemoryStore::new());

    let user = gateway
        .create::<User>(Fields::new().set("name", "A").set("age", 17))
        .await
        .unwrap();

    let updated = gateway
        .update::<User>(user.id(), Fields::new().set("age", 18))
        .await
        .unwrap();

    assert_eq!(name(&updated), "A");
    assert_eq!(updated.scalar("age"), Some(&Bson::Int32(18)));

    assert!(matches!(
        gateway.update::<User>(user.id(), Fields::new().set("email", "x")).await,
        Err(DocLinkError::UnknownField { .. })
    ));

    gateway.delete::<User>(user.id()).await.unwrap();

    assert!(gateway.find_by_id::<User>(user.id()).await.unwrap().is_none());
    assert!(matches!(
        gateway.update::<User>(user.id(), Fields::new().set("age", 1)).await,
        Err(DocLinkError::DocumentNotFound(..))
    ));
}

#[tokio::test]
async fn unregistered_classes_are_rejected() {
    struct Ghost;

    impl DocumentClass for Ghost {
        fn class_name() -> &'static str {
            "Ghost"
        }

        fn fields() -> &'static [&'static str] {
            &[]
        }
    }

    let gateway = gateway(InMemoryStore::new());

    assert!(matches!(
        gateway.find_by_id::<Ghost>("g1").await,
        Err(DocLinkError::ClassNotRegistered(class)) if class == "Ghost"
    ));
}

#[test]
fn registering_a_class_twice_fails() {
    let result = Gateway::builder(InMemoryStore::new())
        .register::<User>()
        .and_then(|builder| builder.register::<User>());

    assert!(matches!(result, Err(DocLinkError::ClassAlreadyRegistered(class)) if class == "User"));
}

#[tokio::test]
async fn unknown_field_wins_over_an_earlier_invalid_reference() {
    let store = InMemoryStore::new();
    let gateway = gateway(store.clone());

    let err = gateway
        .create::<User>(Fields::new().set("manager", 12).set("email", "x"))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        DocLinkError::UnknownField { class, field } if class == "User" && field == "email"
    ));
    assert_eq!(store.count("users").await, 0);
}

#[test]
fn building_with_an_unregistered_reference_target_fails() {
    // User references Team, which is left out.
    let result = Gateway::builder(InMemoryStore::new())
        .register::<User>()
        .and_then(|builder| builder.build());

    assert!(matches!(
        result,
        Err(DocLinkError::UnregisteredReferenceTarget { class, field, target })
            if class == "User" && field == "team" && target == "Team"
    ));
}
