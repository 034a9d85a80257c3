//! Structural properties of the builder: every script yields a single
//! rooted tree with unique ids.

use proptest::prelude::*;
use ramify::graphs::{graph, GraphBuilder};
use rustc_hash::FxHashSet;

#[derive(Debug, Clone)]
enum Op {
    Each,
    Multimap,
    Sub,
    Up,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => Just(Op::Each),
        2 => Just(Op::Multimap),
        2 => Just(Op::Sub),
        2 => Just(Op::Up),
    ]
}

fn apply(builder: GraphBuilder<i64>, op: &Op, count: &mut usize) -> GraphBuilder<i64> {
    match op {
        Op::Each => {
            *count += 1;
            builder.each(|x| x)
        }
        Op::Multimap => {
            *count += 1;
            builder.multimap(|x| vec![x, x])
        }
        Op::Sub => {
            *count += 1;
            builder.subgraph(|g| g.each(|x| x + 1))
        }
        Op::Up => builder.up(),
    }
}

proptest! {
    #[test]
    fn scripts_build_single_trees_with_unique_ids(ops in prop::collection::vec(op_strategy(), 1..40)) {
        let mut builder = graph::<i64>();
        let mut count = 0usize;
        for op in &ops {
            builder = apply(builder, op, &mut count);
        }

        if count == 0 {
            // Scripts of pure navigation never create a node.
            prop_assert!(builder.build().is_err());
        } else {
            let root = builder.build().unwrap();
            prop_assert_eq!(root.count(), count);

            let ids = root.ids();
            let unique: FxHashSet<_> = ids.iter().cloned().collect();
            prop_assert_eq!(unique.len(), ids.len());

            // filter_nodes with a pass-all predicate walks the whole tree.
            prop_assert_eq!(root.filter_nodes(|_| true).len(), count);
        }
    }

    #[test]
    fn sibling_order_is_insertion_order(extra in 1..6usize) {
        let mut builder = graph::<i64>().each(|x| x);
        for n in 0..extra {
            let label = format!("child-{n}");
            builder = builder.subgraph(move |g| g.each(|x| x).with_id(label.as_str()));
        }
        let root = builder.build().unwrap();
        let seen: Vec<_> = root
            .children()
            .iter()
            .map(|c| c.id().as_str().to_owned())
            .collect();
        let expected: Vec<_> = (0..extra).map(|n| format!("child-{n}")).collect();
        prop_assert_eq!(seen, expected);
    }
}
