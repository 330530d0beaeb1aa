//! Todo-list walkthrough: query a table, watch it for changes, run the
//! full insert/update/delete cycle, then tear the subscriptions down.
//!
//! ```sh
//! SUPALITE_URL=http://localhost:54321 SUPALITE_KEY=<anon-key> \
//!     cargo run -p supalite --example todos
//! ```

use std::time::Duration;

use serde::Deserialize;
use serde_json::json;

use supalite::prelude::*;

#[derive(Debug, Deserialize)]
struct Todo {
    id: i64,
    task: String,
    #[serde(default)]
    done: bool,
}

#[tokio::main]
async fn main() -> SupaliteResult<()> {
    tracing_subscriber::fmt::init();

    let url = std::env::var("SUPALITE_URL")
        .unwrap_or_else(|_| "http://localhost:54321".to_string());
    let key = std::env::var("SUPALITE_KEY")
        .map_err(|_| SupaliteError::configuration("SUPALITE_KEY is required"))?;

    let client = SupaliteClient::new(&url, &key)?;

    let todos: RestResponse<Todo> = client
        .from("todos")
        .select("*")
        .order("id.asc")
        .execute()
        .await?;
    println!("{} todos:", todos.len());
    for todo in &todos.data {
        let mark = if todo.done { "x" } else { " " };
        println!("  [{}] #{} {}", mark, todo.id, todo.task);
    }

    // Per-table subscription with one callback per event type.
    let table_sub = client
        .from::<Todo>("todos")
        .on("INSERT", |change: ChangePayload| {
            println!("inserted: {:?}", change.record);
        })
        .on("UPDATE", |change: ChangePayload| {
            println!("updated: {:?}", change.record);
        })
        .on("DELETE", |change: ChangePayload| {
            println!("deleted: {:?}", change.old_record);
        })
        .subscribe()
        .await?;
    println!("subscribed to {}", table_sub.topic());

    // Schema-wide subscription: every change in the schema.
    let schema_sub = client
        .from::<Todo>("*")
        .on("*", |change: ChangePayload| {
            println!("{} on {}.{}", change.event_type, change.schema, change.table);
        })
        .subscribe()
        .await?;
    println!("subscribed to {}", schema_sub.topic());

    let created: Todo = client
        .from("todos")
        .insert(json!({ "task": "try supalite" }))
        .execute()
        .await?
        .into_single()?;
    println!("created #{}", created.id);

    let done: RestResponse<Todo> = client
        .from("todos")
        .update(json!({ "done": true }))
        .filter("id", &format!("eq.{}", created.id))
        .execute()
        .await?;
    println!("marked {} row(s) done", done.len());

    client
        .from::<Todo>("todos")
        .delete()
        .filter("id", &format!("eq.{}", created.id))
        .execute()
        .await?;
    println!("deleted #{}", created.id);

    // Give the change events a moment to arrive.
    tokio::time::sleep(Duration::from_secs(2)).await;

    let remaining = client.remove_subscription(&table_sub).await?;
    println!("unsubscribed; {} subscription(s) remain", remaining);
    let remaining = client.remove_subscription(&schema_sub).await?;
    println!("unsubscribed; {} subscription(s) remain", remaining);

    Ok(())
}
