//! Digit and divisor helpers shared by the column-arithmetic and fraction families.

/// Decimal digits, least significant first. `0` yields `[0]`.
pub fn digits_le(mut n: u64) -> Vec<u8> {
  if n == 0 {
    return vec![0];
  }
  let mut out = Vec::new();
  while n > 0 {
    out.push((n % 10) as u8);
    n /= 10;
  }
  out
}

pub fn digit_count(n: u64) -> usize {
  digits_le(n).len()
}

/// Digit at `place` (0 = units), zero past the most significant digit.
pub fn digit_at(digits: &[u8], place: usize) -> u8 {
  digits.get(place).copied().unwrap_or(0)
}

pub fn place_name(place: usize) -> &'static str {
  match place {
    0 => "units",
    1 => "tens",
    2 => "hundreds",
    3 => "thousands",
    4 => "ten-thousands",
    _ => "higher place",
  }
}

pub fn gcd(mut a: u64, mut b: u64) -> u64 {
  while b != 0 {
    let r = a % b;
    a = b;
    b = r;
  }
  a
}

pub fn smallest_prime_factor(n: u64) -> Option<u64> {
  if n < 2 {
    return None;
  }
  let mut f = 2;
  while f * f <= n {
    if n % f == 0 {
      return Some(f);
    }
    f += 1;
  }
  Some(n)
}

/// Smallest number with `digits` decimal digits.
pub fn lower_bound(digits: u32) -> u64 {
  10u64.pow(digits.saturating_sub(1))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn digits_are_little_endian() {
    assert_eq!(digits_le(586), vec![6, 8, 5]);
    assert_eq!(digits_le(0), vec![0]);
    assert_eq!(digit_at(&digits_le(47), 3), 0);
  }

  #[test]
  fn gcd_and_factors() {
    assert_eq!(gcd(12, 18), 6);
    assert_eq!(gcd(7, 13), 1);
    assert_eq!(smallest_prime_factor(6), Some(2));
    assert_eq!(smallest_prime_factor(49), Some(7));
    assert_eq!(smallest_prime_factor(13), Some(13));
    assert_eq!(smallest_prime_factor(1), None);
  }
}
