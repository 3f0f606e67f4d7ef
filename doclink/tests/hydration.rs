mod common;

use doclink::{memory::InMemoryStore, prelude::*};

use common::{CountingStore, FailingStore, Team, User, gateway, name};

#[tokio::test]
async fn preload_replaces_handles_with_records() {
    let gateway = gateway(InMemoryStore::new());

    let alice = gateway
        .create::<User>(Fields::new().set("name", "A"))
        .await
        .unwrap();
    let bob = gateway
        .create::<User>(Fields::new().set("name", "B").reference("manager", &alice))
        .await
        .unwrap();

    let users = gateway
        .preload::<User, _, _>(["manager"])
        .get()
        .await
        .unwrap();

    let hydrated = users
        .iter()
        .find(|user| user.id() == bob.id())
        .unwrap();

    let manager = hydrated.document("manager").unwrap();
    assert_eq!(manager.id(), alice.id());
    assert_eq!(manager.get_as::<String>("name").unwrap().as_deref(), Some("A"));

    // Alice has no manager; nothing to hydrate
    let root = users
        .iter()
        .find(|user| user.id() == alice.id())
        .unwrap();
    assert!(root.get("manager").is_none());
}

#[tokio::test]
async fn preload_hydrates_several_fields_across_classes() {
    let gateway = gateway(InMemoryStore::new());

    let team = gateway
        .create::<Team>(Fields::new().set("title", "Core"))
        .await
        .unwrap();
    let alice = gateway
        .create::<User>(Fields::new().set("name", "A").reference("team", &team))
        .await
        .unwrap();

    for member in ["B", "C"] {
        gateway
            .create::<User>(
                Fields::new()
                    .set("name", member)
                    .reference("manager", &alice)
                    .reference("team", &team),
            )
            .await
            .unwrap();
    }

    let users = gateway
        .preload::<User, _, _>(["manager", "team", "team"])
        .get()
        .await
        .unwrap();

    for user in users.iter().skip(1) {
        assert_eq!(user.document("manager").unwrap().id(), alice.id());
        assert_eq!(user.document("team").unwrap().class(), "Team");
    }
}

#[tokio::test]
async fn where_chains_hydrate_registered_references_by_default() {
    let gateway = gateway(InMemoryStore::new());

    let alice = gateway
        .create::<User>(Fields::new().set("name", "A").set("age", 50))
        .await
        .unwrap();
    gateway
        .create::<User>(Fields::new().set("name", "B").set("age", 20).reference("manager", &alice))
        .await
        .unwrap();

    let deep = gateway
        .where_::<User>("age", WhereOp::Lt, 30)
        .get()
        .await
        .unwrap();
    assert_eq!(deep[0].document("manager").map(Record::id), Some(alice.id()));

    let shallow = gateway
        .where_::<User>("age", WhereOp::Lt, 30)
        .shallow()
        .get()
        .await
        .unwrap();
    assert!(shallow[0].get("manager").unwrap().is_unhydrated());
}

#[tokio::test]
async fn shared_targets_are_fetched_once_per_execution() {
    let gateway = gateway(CountingStore::default());

    let boss = gateway
        .create::<User>(Fields::new().set("name", "Boss"))
        .await
        .unwrap();

    for i in 0..10 {
        gateway
            .create::<User>(
                Fields::new()
                    .set("name", format!("U{i}"))
                    .reference("manager", &boss),
            )
            .await
            .unwrap();
    }

    gateway.backend().reset();

    let users = gateway
        .preload::<User, _, _>(["manager"])
        .get()
        .await
        .unwrap();

    assert_eq!(users.len(), 11);
    assert!(users.iter().skip(1).all(|user| user.document("manager").is_some()));
    assert_eq!(gateway.backend().reads_of(boss.id()), 1);
    assert_eq!(gateway.backend().total_reads(), 1);
}

#[tokio::test]
async fn pages_hydrate_only_the_rows_they_return() {
    let gateway = gateway(CountingStore::default());

    let mut bosses = Vec::new();

    for boss in ["M1", "M2"] {
        bosses.push(
            gateway
                .create::<User>(Fields::new().set("name", boss).set("age", 60))
                .await
                .unwrap(),
        );
    }

    for (member, boss) in ["A", "B"].into_iter().zip(&bosses) {
        gateway
            .create::<User>(
                Fields::new()
                    .set("name", member)
                    .set("age", 20)
                    .reference("manager", boss),
            )
            .await
            .unwrap();
    }

    gateway.backend().reset();

    let page = gateway
        .where_::<User>("age", WhereOp::Lt, 30)
        .order_by("name", SortDirection::Asc)
        .get_page(PaginationParams::new(1, 1))
        .await
        .unwrap();

    assert_eq!(page.items.len(), 1);
    assert_eq!(name(&page.items[0]), "A");
    assert_eq!(page.next_page, Some(2));
    assert_eq!(page.items[0].document("manager").map(Record::id), Some(bosses[0].id()));
    assert_eq!(gateway.backend().reads_of(bosses[1].id()), 0);
    assert_eq!(gateway.backend().total_reads(), 1);
}

#[tokio::test]
async fn missing_targets_keep_their_handles() {
    let gateway = gateway(InMemoryStore::new());

    let orphan = gateway
        .create::<User>(Fields::new().set("name", "O").set("manager", "gone"))
        .await
        .unwrap();

    let users = gateway
        .preload::<User, _, _>(["manager"])
        .get()
        .await
        .unwrap();

    assert_eq!(users.len(), 1);
    assert_eq!(name(&users[0]), "O");
    assert_eq!(
        users[0].reference_to("manager"),
        Some(&Reference::new("gone", "User"))
    );
    assert_eq!(users[0].id(), orphan.id());
}

#[tokio::test]
async fn failed_reference_fetch_fails_the_whole_query() {
    let gateway = gateway(FailingStore::default());

    let alice = gateway
        .create::<User>(Fields::new().set("name", "A"))
        .await
        .unwrap();
    gateway
        .create::<User>(Fields::new().set("name", "B").reference("manager", &alice))
        .await
        .unwrap();

    gateway.backend().fail_reads();

    let err = gateway
        .preload::<User, _, _>(["manager"])
        .get()
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        DocLinkError::Backend(message) if message == format!("connection reset reading {}", alice.id())
    ));
}

#[tokio::test]
async fn preloading_a_plain_field_is_an_error() {
    let gateway = gateway(InMemoryStore::new());

    let err = gateway
        .preload::<User, _, _>(["name"])
        .get()
        .await
        .unwrap_err();

    assert!(matches!(err, DocLinkError::UnknownReference { field, .. } if field == "name"));
}

#[tokio::test]
async fn hydration_concurrency_of_one_still_resolves_everything() {
    let gateway = Gateway::builder(InMemoryStore::new())
        .register::<User>()
        .unwrap()
        .register::<Team>()
        .unwrap()
        .config(GatewayConfig::new().with_hydration_concurrency(1))
        .build()
        .unwrap();

    let mut previous: Option<Instance<User>> = None;

    for i in 0..5 {
        let fields = Fields::new().set("name", format!("U{i}"));
        let fields = match &previous {
            Some(manager) => fields.reference("manager", manager),
            None => fields,
        };

        previous = Some(gateway.create::<User>(fields).await.unwrap());
    }

    let users = gateway
        .preload::<User, _, _>(["manager"])
        .get()
        .await
        .unwrap();

    assert_eq!(
        users
            .iter()
            .filter(|user| user.document("manager").is_some())
            .count(),
        4
    );
}
