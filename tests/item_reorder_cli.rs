mod support;

use std::fs;

use predicates::str::contains;

use support::TestRoot;

fn chores(root: &TestRoot) -> Result<(i64, Vec<i64>), Box<dyn std::error::Error>> {
    let universe = root.universe("Home")?;
    let category = root.category(universe, "Chores")?;
    let a = root.item(category, "A", None)?;
    let b = root.item(category, "B", None)?;
    let c = root.item(category, "C", None)?;
    Ok((category, vec![a, b, c]))
}

#[test]
fn items_append_to_their_category() -> Result<(), Box<dyn std::error::Error>> {
    let root = TestRoot::new()?;
    let (category, ids) = chores(&root)?;

    for (expected, id) in ids.iter().enumerate() {
        assert_eq!(root.show(*id)?["position"], expected as i64);
    }
    assert_eq!(root.category_order(category)?, ids);
    Ok(())
}

#[test]
fn move_up_swaps_with_previous_item() -> Result<(), Box<dyn std::error::Error>> {
    let root = TestRoot::new()?;
    let (category, ids) = chores(&root)?;
    let (a, b, c) = (ids[0], ids[1], ids[2]);

    let outcome = root.data(&["item", "move", &b.to_string(), "up", "--category-view"])?;
    assert_eq!(outcome["scope"]["scope"], "category");
    assert_eq!(outcome["direction"], "up");
    assert_eq!(outcome["moved"]["item_id"], b);
    assert_eq!(outcome["moved"]["from"], 1);
    assert_eq!(outcome["moved"]["to"], 0);
    assert_eq!(outcome["displaced"]["item_id"], a);
    assert_eq!(outcome["displaced"]["to"], 1);

    assert_eq!(root.category_order(category)?, vec![b, a, c]);

    root.data(&["item", "move", &b.to_string(), "down", "--category-view"])?;
    assert_eq!(root.category_order(category)?, vec![a, b, c]);
    Ok(())
}

#[test]
fn move_past_boundary_is_blocked() -> Result<(), Box<dyn std::error::Error>> {
    let root = TestRoot::new()?;
    let (category, ids) = chores(&root)?;
    let before = fs::read(root.store_file())?;

    let envelope = root.json(&["item", "move", &ids[0].to_string(), "up", "--category-view"])?;
    assert_eq!(envelope["status"], "error");
    assert_eq!(envelope["command"], "item move");
    assert_eq!(envelope["error"]["kind"], "invalid_move");
    assert_eq!(envelope["error"]["code"], 3);
    assert_eq!(envelope["error"]["details"]["boundary"], "top");
    let hint = envelope["next_steps"][0].as_str().ok_or("missing hint")?;
    assert_eq!(
        hint,
        format!("tdl item move {} down --category-view --category {category}", ids[0])
    );

    root.cmd()
        .args(["item", "move", &ids[2].to_string(), "down", "--category-view"])
        .assert()
        .code(3)
        .stderr(contains("already at the bottom"));

    assert_eq!(fs::read(root.store_file())?, before);
    assert_eq!(root.category_order(category)?, ids);

    let hint_args: Vec<&str> = hint.split_whitespace().skip(1).collect();
    root.data(&hint_args)?;
    assert_eq!(root.category_order(category)?, vec![ids[1], ids[0], ids[2]]);
    Ok(())
}

#[test]
fn reopened_item_sharing_a_position_can_be_passed() -> Result<(), Box<dyn std::error::Error>> {
    let root = TestRoot::new()?;
    let universe = root.universe("Home")?;
    let category = root.category(universe, "Chores")?;
    let a = root.item(category, "A", None)?;
    root.data(&["item", "done", &a.to_string()])?;
    let b = root.item(category, "B", None)?;
    root.data(&["item", "undone", &a.to_string()])?;
    assert_eq!(root.show(a)?["position"], root.show(b)?["position"]);
    assert_eq!(root.category_order(category)?, vec![a, b]);

    let outcome = root.data(&["item", "move", &b.to_string(), "up", "--category-view"])?;
    assert_ne!(outcome["moved"]["from"], outcome["moved"]["to"]);
    assert_eq!(root.category_order(category)?, vec![b, a]);

    root.data(&["item", "move", &b.to_string(), "down", "--category-view"])?;
    assert_eq!(root.category_order(category)?, vec![a, b]);
    Ok(())
}

#[test]
fn explicit_category_must_hold_the_item() -> Result<(), Box<dyn std::error::Error>> {
    let root = TestRoot::new()?;
    let (category, ids) = chores(&root)?;
    let universe = root.data(&["universe", "list"])?["universes"][0]["id"]
        .as_i64()
        .ok_or("missing universe")?;
    let errands = root.category(universe, "Errands")?;

    let outcome = root.data(&[
        "item",
        "move",
        &ids[1].to_string(),
        "up",
        "--category-view",
        "--category",
        &category.to_string(),
    ])?;
    assert_eq!(outcome["scope"]["category_id"], category);

    let envelope = root.json(&[
        "item",
        "move",
        &ids[1].to_string(),
        "up",
        "--category-view",
        "--category",
        &errands.to_string(),
    ])?;
    assert_eq!(envelope["error"]["kind"], "not_found");
    assert_eq!(envelope["error"]["details"]["item_id"], ids[1]);

    root.cmd()
        .args(["item", "move", &ids[1].to_string(), "up", "--category", &category.to_string()])
        .assert()
        .code(2);
    Ok(())
}

#[test]
fn completed_items_are_skipped_by_moves() -> Result<(), Box<dyn std::error::Error>> {
    let root = TestRoot::new()?;
    let (category, ids) = chores(&root)?;
    let (a, b, c) = (ids[0], ids[1], ids[2]);

    root.data(&["item", "done", &b.to_string()])?;
    root.data(&["item", "move", &c.to_string(), "up", "--category-view"])?;

    assert_eq!(root.show(c)?["position"], 0);
    assert_eq!(root.show(a)?["position"], 2);
    assert_eq!(root.show(b)?["position"], 1);
    assert_eq!(root.category_order(category)?, vec![c, a, b]);

    let envelope = root.json(&["item", "move", &b.to_string(), "up", "--category-view"])?;
    assert_eq!(envelope["error"]["kind"], "not_found");
    assert_eq!(envelope["error"]["code"], 2);
    Ok(())
}

#[test]
fn explicit_position_overrides_order() -> Result<(), Box<dyn std::error::Error>> {
    let root = TestRoot::new()?;
    let (category, ids) = chores(&root)?;

    let item = root.data(&["item", "edit", &ids[2].to_string(), "--position", "-1"])?;
    assert_eq!(item["position"], -1);
    assert_eq!(root.category_order(category)?, vec![ids[2], ids[0], ids[1]]);
    Ok(())
}

#[test]
fn changing_category_appends_to_destination() -> Result<(), Box<dyn std::error::Error>> {
    let root = TestRoot::new()?;
    let (category, ids) = chores(&root)?;
    let universe = root.data(&["universe", "list"])?["universes"][0]["id"]
        .as_i64()
        .ok_or("missing universe")?;
    let errands = root.category(universe, "Errands")?;
    let milk = root.item(errands, "milk", None)?;

    let moved = root.data(&[
        "item",
        "edit",
        &ids[0].to_string(),
        "--category",
        &errands.to_string(),
    ])?;
    assert_eq!(moved["category_id"], errands);
    assert_eq!(moved["position"], 1);

    assert_eq!(root.category_order(errands)?, vec![milk, ids[0]]);
    assert_eq!(root.category_order(category)?, vec![ids[1], ids[2]]);
    Ok(())
}

#[test]
fn bare_edit_reports_no_fields() -> Result<(), Box<dyn std::error::Error>> {
    let root = TestRoot::new()?;
    let (_, ids) = chores(&root)?;

    let envelope = root.json(&["item", "edit", &ids[0].to_string()])?;
    assert_eq!(envelope["error"]["kind"], "no_fields_provided");
    assert_eq!(envelope["error"]["code"], 2);
    Ok(())
}

#[test]
fn purge_removes_only_completed_items() -> Result<(), Box<dyn std::error::Error>> {
    let root = TestRoot::new()?;
    let (category, ids) = chores(&root)?;

    root.data(&["item", "done", &ids[0].to_string()])?;
    root.data(&["item", "done", &ids[2].to_string()])?;
    let purged = root.data(&["item", "purge"])?;
    assert_eq!(purged["removed"], 2);
    assert_eq!(root.category_order(category)?, vec![ids[1]]);

    root.data(&["item", "rm", &ids[1].to_string()])?;
    assert!(root.category_order(category)?.is_empty());
    Ok(())
}
