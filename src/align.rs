/// Rounds `value` up to the next multiple of `align`.
///
/// `align` must be a power of two. Used to size page-granular mappings.
///
/// # Examples
///
/// ```rust
/// use bumpchain::align_to;
///
/// assert_eq!(align_to!(1, 4096), 4096);
/// assert_eq!(align_to!(4096, 4096), 4096);
/// assert_eq!(align_to!(4097, 4096), 8192);
/// ```
#[macro_export]
macro_rules! align_to {
  ($value:expr, $align:expr) => {
    ($value + $align - 1) & !($align - 1)
  };
}

#[cfg(test)]
mod tests {
  #[test]
  fn test_align_to() {
    for align in [8usize, 64, 4096] {
      assert_eq!(align_to!(0usize, align), 0);

      for i in 0..10 {
        let sizes = (align * i + 1)..=(align * (i + 1));
        let expected = align * (i + 1);

        for size in sizes {
          assert_eq!(expected, align_to!(size, align));
        }
      }
    }
  }
}
