use std::fmt::{Debug, Display};

/// Fixed-size set of small integers. Used to record which entry points reach a module.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct BitSet {
  entries: Vec<u8>,
}

impl BitSet {
  pub fn new(max_bit_count: u32) -> Self {
    Self { entries: vec![0; max_bit_count.div_ceil(8) as usize] }
  }

  pub fn has_bit(&self, bit: u32) -> bool {
    self.entries.get(bit as usize / 8).is_some_and(|byte| byte & (1 << (bit & 7)) != 0)
  }

  pub fn set_bit(&mut self, bit: u32) {
    let idx = bit as usize / 8;
    if idx >= self.entries.len() {
      self.entries.resize(idx + 1, 0);
    }
    self.entries[idx] |= 1 << (bit & 7);
  }

  pub fn union(&mut self, other: &Self) {
    if other.entries.len() > self.entries.len() {
      self.entries.resize(other.entries.len(), 0);
    }
    for (a, b) in self.entries.iter_mut().zip(&other.entries) {
      *a |= b;
    }
  }

  pub fn is_empty(&self) -> bool {
    self.entries.iter().all(|byte| *byte == 0)
  }

  pub fn is_subset_of(&self, other: &Self) -> bool {
    self
      .entries
      .iter()
      .enumerate()
      .all(|(idx, byte)| byte & !other.entries.get(idx).copied().unwrap_or(0) == 0)
  }

  pub fn count_ones(&self) -> u32 {
    self.entries.iter().map(|byte| byte.count_ones()).sum()
  }

  /// Set bits in ascending order.
  pub fn iter_ones(&self) -> impl Iterator<Item = u32> + '_ {
    self.entries.iter().enumerate().flat_map(|(idx, byte)| {
      (0..8u32).filter(move |bit| byte & (1 << bit) != 0).map(move |bit| idx as u32 * 8 + bit)
    })
  }
}

impl Display for BitSet {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let bits = self.entries.iter().rev().map(|byte| format!("{byte:08b}")).collect::<String>();
    f.write_str(&bits)
  }
}

impl Debug for BitSet {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_tuple("BitSet").field(&self.to_string()).finish()
  }
}

#[test]
fn test_bitset() {
  let mut a = BitSet::new(10);
  assert!(a.is_empty());
  a.set_bit(1);
  a.set_bit(9);
  assert!(a.has_bit(9));
  assert!(!a.has_bit(2));
  assert!(!a.has_bit(100));
  assert_eq!(a.iter_ones().collect::<Vec<_>>(), vec![1, 9]);
  assert_eq!(a.to_string(), "0000001000000010");

  let mut b = BitSet::new(10);
  b.set_bit(1);
  assert!(b.is_subset_of(&a));
  assert!(!a.is_subset_of(&b));
  b.union(&a);
  assert_eq!(b, a);
  assert_eq!(b.count_ones(), 2);
}
