//! Property tests for tree queries and simulated widget keyboard models

use proptest::prelude::*;
use rfaria::driver::sim::Behavior;
use rfaria::driver::{widgets, KeyInput, SimDriver, SpecialKey};
use rfaria::protocols::ItemTracking;
use rfaria::reader::query;
use rfaria::reader::{NodeHandle, ScreenReader};
use rfaria::tree::{roles, NodeData, NodeId, SearchPredicate, TreeSnapshot};
use rfaria::{Error, Timing};

const ROLES: [&str; 4] = [roles::GROUP, roles::BUTTON, roles::LINK, roles::LIST_ITEM];

/// Each entry attaches one node under an earlier node
fn shape() -> impl Strategy<Value = Vec<(usize, usize)>> {
    prop::collection::vec((any::<usize>(), 0..ROLES.len()), 1..48)
}

fn build(shape: &[(usize, usize)]) -> (TreeSnapshot, Vec<NodeId>) {
    let mut tree = TreeSnapshot::new("sim://generated", "Generated");
    let mut ids = vec![tree.root().unwrap()];
    for (i, (parent, role)) in shape.iter().enumerate() {
        let parent = ids[parent % ids.len()];
        ids.push(tree.append(parent, NodeData::new(ROLES[*role]).named(format!("n{}", i))));
    }
    (tree, ids)
}

proptest! {
    #[test]
    fn find_all_is_ordered_scoped_and_stable(shape in shape(), pick in any::<usize>(), role in 0..ROLES.len()) {
        let (tree, ids) = build(&shape);
        let scope = ids[pick % ids.len()];
        let pred = SearchPredicate::role(ROLES[role]);

        let found = query::find_all(&tree, scope, &pred);
        prop_assert_eq!(&found, &query::find_all(&tree, scope, &pred));
        prop_assert!(found.iter().all(|id| tree.contains(scope, *id)));

        let order = tree.subtree(scope);
        let positions: Vec<usize> = found
            .iter()
            .map(|id| order.iter().position(|o| o == id).unwrap())
            .collect();
        prop_assert!(positions.windows(2).all(|w| w[0] < w[1]));

        let scope_matches = tree.get(scope).unwrap().role == ROLES[role];
        prop_assert_eq!(found.first() == Some(&scope), scope_matches);
        prop_assert_eq!(query::find(&tree, scope, &pred), found.first().copied());
    }

    #[test]
    fn next_stays_strictly_inside_scope(shape in shape(), pick in any::<usize>(), role in 0..ROLES.len()) {
        let (tree, ids) = build(&shape);
        let scope = ids[pick % ids.len()];
        let pred = SearchPredicate::role(ROLES[role]);

        let next = query::next(&tree, scope, &pred);
        if let Some(id) = next {
            prop_assert_ne!(id, scope);
            prop_assert!(tree.contains(scope, id));
        }
        let expected = query::find_all(&tree, scope, &pred).into_iter().find(|id| *id != scope);
        prop_assert_eq!(next, expected);
    }

    #[test]
    fn get_children_reports_the_first_mismatch(kinds in prop::collection::vec(prop::bool::ANY, 0..12)) {
        let mut tree = TreeSnapshot::new("sim://list", "List");
        let root = tree.root().unwrap();
        let list = tree.append(root, NodeData::new(roles::LIST));
        for (i, is_item) in kinds.iter().enumerate() {
            let role = if *is_item { roles::LIST_ITEM } else { roles::LINK };
            tree.append(list, NodeData::new(role).named(format!("c{}", i)));
        }

        let reader = ScreenReader::new(SimDriver::new(), Timing::immediate());
        reader.store().replace(tree);
        let handle = NodeHandle::new(reader.store().clone(), list);
        match reader.get_children(&handle, roles::LIST_ITEM) {
            Ok(children) => {
                prop_assert!(kinds.iter().all(|k| *k));
                prop_assert_eq!(children.len(), kinds.len());
            }
            Err(Error::RoleMismatch { expected, found }) => {
                prop_assert!(kinds.iter().any(|k| !*k));
                prop_assert_eq!(expected.as_str(), roles::LIST_ITEM);
                prop_assert_eq!(found.as_str(), roles::LINK);
            }
            Err(e) => prop_assert!(false, "unexpected error {}", e),
        }
    }

    #[test]
    fn menu_down_presses_cycle(len in 1usize..8, presses in 0usize..20, focus_tracking in prop::bool::ANY) {
        let tracking = if focus_tracking { ItemTracking::Focus } else { ItemTracking::ActiveDescendant };
        let names: Vec<String> = (0..len).map(|i| format!("Item {}", i)).collect();
        let names: Vec<&str> = names.iter().map(String::as_str).collect();
        let mut tree = TreeSnapshot::new("sim://menu", "Menu");
        let root = tree.root().unwrap();
        let menu = widgets::menu_button(&mut tree, root, "Actions", &names, tracking);
        let button = tree.subtree(root)[1];
        tree.set_focus(Some(button));

        press(&*menu, &mut tree, SpecialKey::Down);
        for _ in 0..presses {
            press(&*menu, &mut tree, SpecialKey::Down);
        }
        prop_assert_eq!(selected_name(&tree, tracking), Some(format!("Item {}", presses % len)));
        press(&*menu, &mut tree, SpecialKey::Home);
        prop_assert_eq!(selected_name(&tree, tracking), Some("Item 0".to_string()));
        press(&*menu, &mut tree, SpecialKey::End);
        prop_assert_eq!(selected_name(&tree, tracking), Some(format!("Item {}", len - 1)));
    }

    #[test]
    fn listbox_move_shifts_one_option_and_back(from_len in 1usize..6, to_len in 0usize..6) {
        let from: Vec<String> = (0..from_len).map(|i| format!("Keep {}", i)).collect();
        let to: Vec<String> = (0..to_len).map(|i| format!("Drop {}", i)).collect();
        let from: Vec<&str> = from.iter().map(String::as_str).collect();
        let to: Vec<&str> = to.iter().map(String::as_str).collect();
        let mut tree = TreeSnapshot::new("sim://lists", "Lists");
        let root = tree.root().unwrap();
        let lists = widgets::rearrangeable_listboxes(&mut tree, root, ("Important:", from.as_slice()), ("Unimportant:", to.as_slice()));
        let boxes = query::find_all(&tree, root, &SearchPredicate::role(roles::LIST_BOX));
        let move_to = query::find(&tree, root, &SearchPredicate::new(roles::BUTTON, "Move to Unimportant")).unwrap();
        let move_from = query::find(&tree, root, &SearchPredicate::new(roles::BUTTON, "Move to Important")).unwrap();
        let counts = |tree: &TreeSnapshot| {
            let options = SearchPredicate::role(roles::LIST_BOX_OPTION);
            (query::find_all(tree, boxes[0], &options).len(), query::find_all(tree, boxes[1], &options).len())
        };

        lists.on_default(&mut tree, move_to);
        prop_assert_eq!(counts(&tree), (from_len - 1, to_len + 1));
        lists.on_default(&mut tree, move_from);
        prop_assert_eq!(counts(&tree), (from_len, to_len));
    }

    #[test]
    fn radio_group_keeps_one_checked(keys in prop::collection::vec(0usize..4, 1..24)) {
        let mut tree = TreeSnapshot::new("sim://radio", "Radio");
        let root = tree.root().unwrap();
        let group = widgets::radio_group(&mut tree, root, "Crust", &["Regular", "Deep dish", "Thin"], ItemTracking::Focus);
        let radios = tree.subtree(root)[2..].to_vec();
        tree.set_focus(Some(radios[0]));

        let moves = [SpecialKey::Down, SpecialKey::Up, SpecialKey::Right, SpecialKey::Space];
        for k in keys {
            press(&*group, &mut tree, moves[k]);
            let checked: Vec<NodeId> = radios
                .iter()
                .copied()
                .filter(|r| tree.attr(*r, "aria-checked") == Some("true"))
                .collect();
            prop_assert_eq!(checked.len(), 1);
            prop_assert_eq!(tree.focus(), Some(checked[0]));
        }
    }
}

fn press(behavior: &dyn Behavior, tree: &mut TreeSnapshot, key: SpecialKey) {
    behavior.on_key(tree, KeyInput::from(key));
}

fn selected_name(tree: &TreeSnapshot, tracking: ItemTracking) -> Option<String> {
    let selected = match tracking {
        ItemTracking::Focus => tree.focus(),
        ItemTracking::ActiveDescendant => tree.focus().and_then(|m| tree.get(m)?.active_descendant),
    };
    selected.and_then(|id| tree.get(id)?.name.clone())
}
