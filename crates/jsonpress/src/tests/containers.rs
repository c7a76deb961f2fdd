use alloc::{string::String, vec::Vec};

use crate::{Array, Object, Value};

const COUNT: usize = 0x7FFF;

/// Seven-letter base-26 keys: `AAAAAAA`, `BAAAAAA`, ...
fn key(i: usize) -> String {
    let mut place = 1;
    (0..7)
        .map(|_| {
            let letter = b'A' + u8::try_from(i / place % 26).unwrap();
            place *= 26;
            char::from(letter)
        })
        .collect()
}

fn number(i: usize) -> Value {
    Value::Number(f64::from(u32::try_from(i * 7919 % 65_521).unwrap()))
}

#[test]
fn object_holds_many_similar_keys() {
    let mut object = Object::new();
    for i in 0..COUNT {
        assert_eq!(object.len(), i);
        assert_eq!(object.set(key(i), number(i)).unwrap(), None);
    }

    for i in 0..COUNT {
        let k = key(i);
        assert_eq!(object.get(&k), Some(&number(i)), "{k}");
        assert_eq!(object.remove(&k), Some(number(i)));
    }
    assert!(object.is_empty());
}

#[test]
fn array_push_and_pop_from_the_back() {
    let mut array = Array::new();
    for i in 0..COUNT {
        array.push(number(i)).unwrap();
    }
    assert_eq!(array.len(), COUNT);

    for i in (0..COUNT).rev() {
        assert_eq!(array.get(i), Some(&number(i)));
        assert_eq!(array.pop(), Some(number(i)));
    }
    assert!(array.is_empty());
}

#[test]
fn array_insert_and_remove_at_the_front() {
    let count = 0x800;
    let mut array = Array::new();
    for i in (0..count).rev() {
        array.insert(0, number(i)).unwrap();
    }
    assert_eq!(array.len(), count);

    let mut seen = Vec::with_capacity(count);
    while !array.is_empty() {
        seen.push(array.remove(0));
    }
    assert!(seen.iter().enumerate().all(|(i, v)| *v == number(i)));
}

#[test]
fn keys_spell_out_base_26() {
    assert_eq!(key(0), "AAAAAAA");
    assert_eq!(key(1), "BAAAAAA");
    assert_eq!(key(26), "ABAAAAA");
    assert_eq!(key(COUNT - 1), "GMWBAAA");
}
