use std::alloc::Layout;
use std::cell::Cell;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::ptr::NonNull;
use std::rc::Rc;

use nexus_seq::{Allocator, ArrayPos, DynamicArray, Error, Global};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Refuses allocations while `fail` is set; counts live blocks.
#[derive(Clone, Default)]
struct Flaky {
    fail: Rc<Cell<bool>>,
    live: Rc<Cell<isize>>,
}

impl Allocator for Flaky {
    fn allocate(&mut self, layout: Layout) -> Result<NonNull<u8>, Error> {
        if self.fail.get() {
            return Err(Error::OutOfMemory {
                size: layout.size(),
                align: layout.align(),
            });
        }
        self.live.set(self.live.get() + 1);
        Global.allocate(layout)
    }

    unsafe fn deallocate(&mut self, ptr: NonNull<u8>, layout: Layout) {
        self.live.set(self.live.get() - 1);
        unsafe { Global.deallocate(ptr, layout) }
    }
}

// =============================================================================
// Growth
// =============================================================================

#[test]
fn push_back_one_to_five_capacities() {
    let mut array = DynamicArray::new();
    let capacities: Vec<usize> = (1..=5)
        .map(|i| {
            array.push_back(i);
            array.capacity()
        })
        .collect();
    assert_eq!(capacities, [1, 2, 4, 4, 8]);
}

#[test]
fn insert_growth_matches_push_growth() {
    let mut array = DynamicArray::new();
    let mut capacities = Vec::new();
    for i in 0..5 {
        array.insert(array.begin(), i);
        capacities.push(array.capacity());
    }
    assert_eq!(capacities, [1, 2, 4, 4, 8]);
    assert_eq!(array, [4, 3, 2, 1, 0]);
}

#[test]
fn reserve_then_push_keeps_capacity() {
    let mut array = DynamicArray::new();
    array.reserve(10);
    for i in 0..10 {
        array.push_back(i);
    }
    assert_eq!(array.capacity(), 10);
    array.push_back(10);
    assert_eq!(array.capacity(), 20);
}

#[test]
fn reserve_at_or_below_capacity_keeps_addresses() {
    let mut array = DynamicArray::from([1u64, 2, 3, 4]);
    let addresses: Vec<*const u64> = array.iter().map(|v| v as *const u64).collect();
    array.reserve(4);
    array.reserve(1);
    let after: Vec<*const u64> = array.iter().map(|v| v as *const u64).collect();
    assert_eq!(addresses, after);
}

// =============================================================================
// Erase
// =============================================================================

#[test]
fn erase_first_of_three_strings() {
    let mut array = DynamicArray::from(["10", "20", "30"].map(String::from));
    let pos = array.erase(array.begin());
    assert_eq!(array, ["20", "30"].map(String::from));
    assert_eq!(array.len(), 2);
    assert_eq!(array.get_at(pos).map(String::as_str), Some("20"));
}

#[test]
fn erase_range_to_end_is_truncation() {
    let mut array: DynamicArray<i32> = (0..6).collect();
    let cap = array.capacity();
    let pos = array.erase_range(array.begin() + 4, array.end());
    assert_eq!(pos, array.end());
    assert_eq!(array, [0, 1, 2, 3]);
    assert_eq!(array.capacity(), cap);
}

#[test]
fn defensive_positions_leave_array_unchanged() {
    let mut array = DynamicArray::from([1, 2, 3]);
    for pos in [array.begin() - 1, array.end() + 1, ArrayPos::new(usize::MAX / 2)] {
        assert_eq!(array.insert(pos, 0), pos);
        assert_eq!(array.emplace_with(pos, || unreachable!()), pos);
        assert_eq!(array.erase(pos), pos);
    }
    let (first, last) = (array.begin() + 2, array.begin() + 1);
    assert_eq!(array.erase_range(first, last), first);
    assert_eq!(array, [1, 2, 3]);
}

// =============================================================================
// Access
// =============================================================================

#[test]
fn at_reports_index_and_length() {
    let array = DynamicArray::from([1, 2]);
    match array.at(5) {
        Err(Error::OutOfRange { index, len }) => assert_eq!((index, len), (5, 2)),
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(
        array.at(5).unwrap_err().to_string(),
        "index 5 out of range for length 2"
    );
}

#[test]
#[should_panic]
fn indexing_past_end_panics() {
    let array = DynamicArray::from([1, 2]);
    let _value = array[2];
}

#[test]
fn slice_views() {
    let mut array = DynamicArray::from([3, 1, 2]);
    array.sort();
    assert_eq!(&array[..], &[1, 2, 3]);
    assert!(array.contains(&2));
    assert_eq!(array.data(), array.as_ptr());
    assert_eq!(unsafe { *array.data().add(1) }, 2);
}

#[test]
fn position_arithmetic_walks_array() {
    let array = DynamicArray::from([10, 20, 30, 40]);
    let mut pos = array.begin();
    let mut seen = Vec::new();
    while pos != array.end() {
        seen.push(array[pos.index()]);
        pos += 1;
    }
    assert_eq!(seen, [10, 20, 30, 40]);
    assert_eq!(array.end() - array.begin(), 4);
    assert_eq!(array.get_at(array.end() - 1), Some(&40));
}

// =============================================================================
// Failure
// =============================================================================

#[test]
fn allocation_failure_is_all_or_nothing() {
    let alloc = Flaky::default();
    let mut array = DynamicArray::new_in(alloc.clone());
    for i in 0..4 {
        array.push_back(i);
    }
    alloc.fail.set(true);
    assert!(matches!(array.try_push_back(4), Err(Error::OutOfMemory { .. })));
    assert!(array.try_insert(array.begin(), 9).is_err());
    assert!(array.try_emplace_back_with(|| unreachable!()).is_err());
    assert!(array.try_reserve(64).is_err());
    assert_eq!(array, [0, 1, 2, 3]);
    assert_eq!(array.capacity(), 4);

    alloc.fail.set(false);
    array.push_back(4);
    assert_eq!(array.capacity(), 8);
    drop(array);
    assert_eq!(alloc.live.get(), 0);
}

#[test]
fn panicking_emplace_during_growth_keeps_old_block() {
    let alloc = Flaky::default();
    let mut array = DynamicArray::new_in(alloc.clone());
    for i in 0..4 {
        array.push_back(i.to_string());
    }
    let before = array.data();
    let result = catch_unwind(AssertUnwindSafe(|| {
        array.emplace_with(array.begin() + 2, || panic!("constructor failed"));
    }));
    assert!(result.is_err());
    assert_eq!(array.data(), before);
    assert_eq!(array.capacity(), 4);
    assert_eq!(array, ["0", "1", "2", "3"].map(String::from));
    assert_eq!(alloc.live.get(), 1);
}

#[test]
fn panicking_emplace_without_growth_keeps_elements() {
    let mut array = DynamicArray::with_capacity(8);
    array.extend([1, 2, 3]);
    let result = catch_unwind(AssertUnwindSafe(|| {
        array.emplace_with(array.begin(), || panic!("constructor failed"));
    }));
    assert!(result.is_err());
    assert_eq!(array, [1, 2, 3]);
}

#[test]
fn from_elem_clone_panic_releases_everything() {
    struct Bomb(Rc<Cell<usize>>);

    impl Clone for Bomb {
        fn clone(&self) -> Self {
            let n = self.0.get();
            if n == 3 {
                panic!("clone failed");
            }
            self.0.set(n + 1);
            Bomb(Rc::clone(&self.0))
        }
    }

    let alloc = Flaky::default();
    let counter = Rc::new(Cell::new(0));
    let result = catch_unwind(AssertUnwindSafe(|| {
        DynamicArray::from_elem_in(Bomb(Rc::clone(&counter)), 10, alloc.clone())
    }));
    assert!(result.is_err());
    assert_eq!(Rc::strong_count(&counter), 1);
    assert_eq!(alloc.live.get(), 0);
}

// =============================================================================
// Randomized against Vec
// =============================================================================

#[test]
fn random_operations_match_vec() {
    let mut rng = SmallRng::seed_from_u64(0x5eed);
    let mut array: DynamicArray<u32> = DynamicArray::new();
    let mut model: Vec<u32> = Vec::new();

    for step in 0..5_000u32 {
        match rng.gen_range(0..7) {
            0 | 1 => {
                array.push_back(step);
                model.push(step);
            }
            2 => {
                let at = rng.gen_range(0..=model.len());
                array.insert(ArrayPos::new(at), step);
                model.insert(at, step);
            }
            3 if !model.is_empty() => {
                let at = rng.gen_range(0..model.len());
                array.erase(ArrayPos::new(at));
                model.remove(at);
            }
            4 => assert_eq!(array.pop_back(), model.pop()),
            5 if !model.is_empty() => {
                let a = rng.gen_range(0..=model.len());
                let b = rng.gen_range(a..=model.len());
                array.erase_range(ArrayPos::new(a), ArrayPos::new(b));
                model.drain(a..b);
            }
            6 => {
                if rng.gen_range(0..10) == 0 {
                    array.shrink_to_fit();
                    assert_eq!(array.capacity(), array.len());
                }
            }
            _ => {}
        }
        assert_eq!(array.len(), model.len());
        assert!(array.len() <= array.capacity());
    }
    assert_eq!(array.as_slice(), model.as_slice());
}
