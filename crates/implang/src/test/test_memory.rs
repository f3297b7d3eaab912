// Memory layout unit tests, driven through a hand-built registry.

use crate::ir::{VarRegistry, Variable};
use crate::memory::{MemoryMap, TEMP_REGION_TOP};
use smol_str::SmolStr;

fn name(s: &str) -> SmolStr {
    SmolStr::new(s)
}

#[test]
fn test_cell_zero_is_never_allocated() {
    let mut vars = VarRegistry::new();
    vars.register(Variable::scalar(name("a"), None));
    let map = MemoryMap::build(&vars);
    assert_eq!(map.address_of("a").unwrap(), 1);
}

#[test]
fn test_scalars_allocated_in_registration_order() {
    let mut vars = VarRegistry::new();
    vars.register(Variable::scalar(name("a"), None));
    vars.register(Variable::scalar(name("b"), None));
    vars.register(Variable::scalar(name("c"), None));
    let map = MemoryMap::build(&vars);
    assert_eq!(map.address_of("a").unwrap(), 1);
    assert_eq!(map.address_of("b").unwrap(), 2);
    assert_eq!(map.address_of("c").unwrap(), 3);
}

#[test]
fn test_array_layout_pointer_cell_then_storage() {
    let mut vars = VarRegistry::new();
    vars.register(Variable::array(name("a"), 1, 5, None));
    vars.register(Variable::scalar(name("x"), None));
    let map = MemoryMap::build(&vars);
    let cell = map.cell("a").unwrap();
    assert_eq!(cell.address, 1);
    assert!(cell.is_array);
    // storage occupies cells 2..=6; element 1 lives at cell 2
    assert_eq!(cell.zero_address, Some(1));
    assert_eq!(map.address_of("x").unwrap(), 7);
}

#[test]
fn test_zero_address_shifts_with_lower_bound() {
    let mut vars = VarRegistry::new();
    vars.register(Variable::array(name("a"), 10, 3, None));
    let map = MemoryMap::build(&vars);
    // element 10 lives at cell 2, so the zero address is 2 - 10
    assert_eq!(map.cell("a").unwrap().zero_address, Some(-8));
}

#[test]
fn test_negative_lower_bound_zero_address() {
    let mut vars = VarRegistry::new();
    vars.register(Variable::array(name("a"), -2, 5, None));
    let map = MemoryMap::build(&vars);
    // element -2 lives at cell 2, so the zero address is 2 + 2
    assert_eq!(map.cell("a").unwrap().zero_address, Some(4));
}

#[test]
fn test_array_parameter_takes_one_cell() {
    let mut vars = VarRegistry::new();
    vars.register(Variable::array_param(name("p#t"), name("p")));
    vars.register(Variable::scalar(name("x"), None));
    let map = MemoryMap::build(&vars);
    assert_eq!(map.address_of("p#t").unwrap(), 1);
    assert_eq!(map.address_of("x").unwrap(), 2);
}

#[test]
fn test_constants_deduplicated_by_value() {
    let mut vars = VarRegistry::new();
    vars.register(Variable::scalar(name("x"), None));
    vars.register(Variable::constant(7));
    vars.register(Variable::constant(-7));
    vars.register(Variable::constant(7));
    let map = MemoryMap::build(&vars);
    assert_eq!(map.address_of("7").unwrap(), 2);
    assert_eq!(map.address_of("neg7").unwrap(), 3);
    assert_eq!(map.constant_cells().len(), 2);
}

#[test]
fn test_constants_come_after_regular_variables() {
    let mut vars = VarRegistry::new();
    vars.register(Variable::constant(1));
    vars.register(Variable::scalar(name("a"), None));
    let map = MemoryMap::build(&vars);
    // the constant registered first still lands after the scalar pass
    assert_eq!(map.address_of("a").unwrap(), 1);
    assert_eq!(map.address_of("1").unwrap(), 2);
}

#[test]
fn test_temporaries_grow_down_from_the_top() {
    let mut vars = VarRegistry::new();
    vars.register(Variable::temp(name("t1"), None));
    vars.register(Variable::temp(name("t2"), None));
    let map = MemoryMap::build(&vars);
    assert_eq!(map.address_of("t1").unwrap(), TEMP_REGION_TOP - 1);
    assert_eq!(map.address_of("t2").unwrap(), TEMP_REGION_TOP - 2);
}

#[test]
fn test_missing_variable_is_an_error() {
    let vars = VarRegistry::new();
    let map = MemoryMap::build(&vars);
    assert!(map.address_of("ghost").is_err());
}

#[test]
fn test_registry_first_touch_wins() {
    let mut vars = VarRegistry::new();
    let first = vars.register(Variable::scalar(name("a"), None));
    let second = vars.register(Variable::temp(name("a"), None));
    assert_eq!(first, second);
    assert!(!second.is_temp);
    assert_eq!(vars.len(), 1);
}
