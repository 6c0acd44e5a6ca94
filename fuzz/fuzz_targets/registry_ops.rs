#![no_main]

use std::collections::HashMap;

use libfuzzer_sys::fuzz_target;
use stubgate::{StubPointer, StubRegistry};
use widestring::U16Str;

// Each op is 4 bytes: opcode, key length, two bytes of pointer payload. Keys are taken from a
// small code unit alphabet (including a lone surrogate) so operations collide often.
const ALPHABET: [u16; 4] = [0x0041, 0x002E, 0x00E9, 0xD800];

fuzz_target!(|data: &[u8]| {
    let registry = StubRegistry::new();
    let mut model: HashMap<Vec<u16>, StubPointer> = HashMap::new();

    for op in data.chunks_exact(4) {
        let key: Vec<u16> = (0..(op[1] % 6) as usize)
            .map(|i| ALPHABET[((op[1] as usize >> i) + i) % ALPHABET.len()])
            .collect();
        let wide = U16Str::from_slice(&key);
        let pointer = StubPointer::new(usize::from(u16::from_le_bytes([op[2], op[3]])));

        match op[0] % 5 {
            0 => {
                let expected = !model.contains_key(&key);
                if expected {
                    model.insert(key.clone(), pointer);
                }
                assert_eq!(registry.try_add(wide, pointer), expected);
            }
            1 => assert_eq!(registry.try_get(wide), model.get(&key).copied()),
            2 => assert_eq!(registry.try_remove(wide), model.remove(&key)),
            3 => {
                registry.clear();
                model.clear();
            }
            _ => assert_eq!(registry.contains_key(wide), model.contains_key(&key)),
        }
        assert_eq!(registry.len(), model.len());
    }
});
