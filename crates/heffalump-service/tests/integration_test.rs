use heffalump_service::lifecycle::HeffalumpSystem;
use heffalump_service::service::status;
use soap_adapter::{Condition, Query, Resource, Value};

async fn create(system: &HeffalumpSystem, attributes: &[(&str, Value)]) -> Resource {
    let mut resource = Resource::new(system.heffalump.clone());
    for (name, value) in attributes {
        resource.set(name, value.clone()).unwrap();
    }
    let mut batch = vec![resource];
    system.adapter.create(&mut batch).await.unwrap();
    batch.remove(0)
}

async fn all(system: &HeffalumpSystem, condition: Condition) -> Vec<Resource> {
    let query = Query::all(system.heffalump.clone()).filter(condition);
    system.adapter.read(&query).await.unwrap()
}

/// The three heffalumps the query tests search through.
async fn herd(system: &HeffalumpSystem) -> (Resource, Resource, Resource) {
    let red = create(system, &[("color", Value::from("red"))]).await;
    let two = create(system, &[("num_spots", Value::from(2))]).await;
    let five = create(system, &[("num_spots", Value::from(5))]).await;
    (red, two, five)
}

#[tokio::test]
async fn create_sets_the_identity_field() {
    let system = HeffalumpSystem::new().unwrap();

    let peach = create(&system, &[("color", Value::from("peach"))]).await;

    assert_eq!(peach.get("id"), Some(&Value::Integer(1)));
    assert_eq!(peach.get("color"), Some(&Value::from("peach")));
    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn created_resources_are_found_by_query_all() {
    let system = HeffalumpSystem::new().unwrap();
    let peach = create(&system, &[("color", Value::from("peach"))]).await;

    let everyone = system
        .adapter
        .read(&Query::all(system.heffalump.clone()))
        .await
        .unwrap();

    assert!(everyone.contains(&peach));
    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn update_changes_altered_fields_only() {
    let system = HeffalumpSystem::new().unwrap();
    let indigo = create(&system, &[("color", Value::from("indigo"))]).await;
    let id = indigo.get("id").cloned().unwrap();

    let mut batch = vec![indigo];
    system
        .adapter
        .update(&[("color", Value::from("violet"))], &mut batch)
        .await
        .unwrap();
    assert_eq!(batch[0].get("id"), Some(&id));

    system
        .adapter
        .update(&[("num_spots", Value::from(3))], &mut batch)
        .await
        .unwrap();

    let stored = system
        .adapter
        .find(&system.heffalump, &[id])
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.get("color"), Some(&Value::from("violet")));
    assert_eq!(stored.get("num_spots"), Some(&Value::Integer(3)));
    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn delete_removes_the_resource() {
    let system = HeffalumpSystem::new().unwrap();
    let green = create(&system, &[("color", Value::from("forest green"))]).await;
    let id = green.get("id").cloned().unwrap();

    let deleted = system.adapter.delete(&[green]).await.unwrap();

    assert_eq!(deleted, 1);
    assert!(system
        .adapter
        .find(&system.heffalump, &[id])
        .await
        .unwrap()
        .is_none());
    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn ranges() {
    let system = HeffalumpSystem::new().unwrap();
    let (_, _, five) = herd(&system).await;

    assert!(all(&system, Condition::range("num_spots", 1, 5)).await.contains(&five));
    assert!(all(&system, Condition::range_exclusive("num_spots", 1, 6)).await.contains(&five));
    assert!(!all(&system, Condition::range("num_spots", 1, 4)).await.contains(&five));
    assert!(!all(&system, Condition::range_exclusive("num_spots", 1, 5)).await.contains(&five));
    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn negated_conditions() {
    let system = HeffalumpSystem::new().unwrap();
    let (red, two, five) = herd(&system).await;

    assert!(!all(&system, Condition::eql("color", "red").not()).await.contains(&red));
    assert!(all(&system, Condition::eql("color", "black").not()).await.contains(&red));

    let not_nil = all(&system, Condition::eql("color", Value::Nil).not()).await;
    assert!(not_nil.contains(&red));
    assert!(!not_nil.contains(&two));

    let odd = Condition::one_of("num_spots", [1, 3, 5, 7]).not();
    let not_odd = all(&system, odd).await;
    assert!(not_odd.contains(&two));
    assert!(!not_odd.contains(&five));

    assert!(all(&system, Condition::range("num_spots", 1, 4).not()).await.contains(&five));
    assert!(all(&system, Condition::range_exclusive("num_spots", 1, 5).not()).await.contains(&five));
    assert!(!all(&system, Condition::range("num_spots", 1, 5).not()).await.contains(&five));
    assert!(!all(&system, Condition::range_exclusive("num_spots", 1, 6).not()).await.contains(&five));
    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn boolean_conditions() {
    let system = HeffalumpSystem::new().unwrap();
    let striped = create(&system, &[("striped", Value::from(true))]).await;
    let plain = create(&system, &[("striped", Value::from(false))]).await;

    let hits = all(&system, Condition::eql("striped", true)).await;
    assert!(hits.contains(&striped));
    assert!(!hits.contains(&plain));

    let misses = all(&system, Condition::eql("striped", true).not()).await;
    assert!(!misses.contains(&striped));
    assert!(misses.contains(&plain));
    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn like() {
    let system = HeffalumpSystem::new().unwrap();
    let (red, _, _) = herd(&system).await;

    assert!(all(&system, Condition::like("color", "%ed")).await.contains(&red));
    assert!(!all(&system, Condition::like("color", "%blak%")).await.contains(&red));
    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn comparisons() {
    let system = HeffalumpSystem::new().unwrap();
    let (_, two, _) = herd(&system).await;

    assert!(all(&system, Condition::gt("num_spots", 1)).await.contains(&two));
    assert!(!all(&system, Condition::gt("num_spots", 3)).await.contains(&two));

    assert!(all(&system, Condition::gte("num_spots", 1)).await.contains(&two));
    assert!(all(&system, Condition::gte("num_spots", 2)).await.contains(&two));
    assert!(!all(&system, Condition::gte("num_spots", 3)).await.contains(&two));

    assert!(all(&system, Condition::lt("num_spots", 3)).await.contains(&two));
    assert!(!all(&system, Condition::lt("num_spots", 2)).await.contains(&two));

    assert!(all(&system, Condition::lte("num_spots", 3)).await.contains(&two));
    assert!(all(&system, Condition::lte("num_spots", 2)).await.contains(&two));
    assert!(!all(&system, Condition::lte("num_spots", 1)).await.contains(&two));
    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn limit() {
    let system = HeffalumpSystem::new().unwrap();
    herd(&system).await;

    let query = Query::all(system.heffalump.clone()).with_limit(2);
    assert_eq!(system.adapter.read(&query).await.unwrap().len(), 2);
    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn outage_surfaces_as_server_unavailable() {
    let system = HeffalumpSystem::new().unwrap();
    system.client.set_available(false).await.unwrap();

    let mut batch = vec![Resource::new(system.heffalump.clone()).with("color", "grey").unwrap()];
    let err = system.adapter.create(&mut batch).await.unwrap_err();
    assert!(err.is_server_unavailable());
    assert!(batch[0].is_new());

    system.client.set_available(true).await.unwrap();
    system.adapter.create(&mut batch).await.unwrap();
    assert!(!batch[0].is_new());
    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn domain_rejection_keeps_its_detail() {
    let system = HeffalumpSystem::new().unwrap();
    let mut batch = vec![
        Resource::new(system.heffalump.clone()).with("num_spots", -1).unwrap(),
        Resource::new(system.heffalump.clone()).with("num_spots", 4).unwrap(),
    ];

    let err = system.adapter.create(&mut batch).await.unwrap_err();

    assert!(!err.is_server_unavailable());
    let fault = err.domain_fault().unwrap();
    assert_eq!(fault.result().records()[0].errors()[0].status_code, status::INVALID_FIELD);
    assert!(batch[1].is_new());
    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn deleting_twice_is_a_domain_fault() {
    let system = HeffalumpSystem::new().unwrap();
    let gone = create(&system, &[("color", Value::from("blue"))]).await;
    system.adapter.delete(std::slice::from_ref(&gone)).await.unwrap();

    let err = system.adapter.delete(&[gone]).await.unwrap_err();
    assert_eq!(
        err.domain_fault().unwrap().result().records()[0].errors()[0].status_code,
        status::ENTITY_IS_DELETED
    );
    system.shutdown().await.unwrap();
}
