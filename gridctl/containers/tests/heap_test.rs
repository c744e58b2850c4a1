//! Heap and priority queue tests for gridctl-containers

use gridctl_containers::{Heap, NaturalOrder, NodeId, PriorityQueue, TaskQueue};
use gridctl_core::ErrorCode;
use proptest::prelude::*;

const NODES: usize = 10;

#[derive(Debug, Clone)]
enum Op {
    Push(usize),
    PopSelf(usize),
    Pop,
    Update(usize, u8),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..NODES).prop_map(Op::Push),
        (0..NODES).prop_map(Op::PopSelf),
        Just(Op::Pop),
        (0..NODES, any::<u8>()).prop_map(|(n, v)| Op::Update(n, v)),
    ]
}

proptest! {
    #[test]
    fn heap_property_holds(
        values in proptest::collection::vec(any::<u8>(), NODES),
        ops in proptest::collection::vec(op(), 0..96),
    ) {
        let mut heap: Heap<u8, NaturalOrder, 16> = Heap::default();
        let nodes: Vec<NodeId> = values.iter().map(|&v| heap.alloc(v).unwrap()).collect();
        for op in &ops {
            match *op {
                Op::Push(n) => {
                    let expected = if heap.contains(nodes[n]) {
                        Err(ErrorCode::InvalidArgument)
                    } else {
                        Ok(())
                    };
                    prop_assert_eq!(heap.push(nodes[n]), expected);
                }
                Op::PopSelf(n) => prop_assert_eq!(heap.pop_self(nodes[n]), Ok(())),
                Op::Pop => {
                    let root = heap.peek();
                    prop_assert_eq!(heap.pop(), root);
                }
                Op::Update(n, v) => prop_assert_eq!(heap.update(nodes[n], v), Ok(())),
            }
            prop_assert!(heap.check(), "heap broken after {:?}", op);
        }
    }

    #[test]
    fn pops_come_out_sorted(values in proptest::collection::vec(any::<u8>(), 0..NODES)) {
        let mut queue: PriorityQueue<u8, NaturalOrder, 16> = PriorityQueue::default();
        for &v in &values {
            let node = queue.alloc(v).unwrap();
            queue.push(node).unwrap();
        }
        let mut out = Vec::new();
        while let Some(node) = queue.pop() {
            out.push(*queue.get(node).unwrap());
        }
        let mut expected = values.clone();
        expected.sort_unstable_by(|a, b| b.cmp(a));
        prop_assert_eq!(out, expected);
    }
}

#[test]
fn test_equal_priorities_are_not_reordered_by_rewrite() {
    let mut heap: Heap<u8, NaturalOrder, 4> = Heap::default();
    let a = heap.alloc(5).unwrap();
    let b = heap.alloc(5).unwrap();
    heap.push(a).unwrap();
    heap.push(b).unwrap();
    assert_eq!(heap.peek(), Some(a));
    heap.update(b, 5).unwrap();
    assert_eq!(heap.peek(), Some(a));
    assert!(heap.check());
}
