/// Deterministically permutes `alphabet` using `salt`.
///
/// The same input always produces the same permutation. An empty salt leaves
/// the alphabet untouched.
pub(crate) fn consistent_shuffle(alphabet: &mut [u8], salt: &[u8]) {
    if salt.is_empty() {
        return;
    }

    let mut v = 0_usize;
    let mut p = 0_usize;
    for i in (1..alphabet.len()).rev() {
        v %= salt.len();
        let n = usize::from(salt[v]);
        p += n;
        let j = (n + v + p) % i;
        alphabet.swap(i, j);
        v += 1;
    }
}
