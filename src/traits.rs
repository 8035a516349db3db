/// Label comparison used by the isomorphism matcher.
///
/// The graph engine knows nothing about chemistry: it only asks whether a
/// vertex (or edge) payload on one side may stand in for a payload on the
/// other. Full isomorphism uses `V: Equivalent<V>`; substructure search
/// compares host payloads against pattern payloads, so `Rhs` may differ
/// from `Self`.
pub trait Equivalent<Rhs: ?Sized = Self> {
    fn equivalent(&self, other: &Rhs) -> bool;
}

impl<'a, 'b, A, B> Equivalent<&'b B> for &'a A
where
    A: Equivalent<B> + ?Sized,
    B: ?Sized,
{
    fn equivalent(&self, other: &&'b B) -> bool {
        (**self).equivalent(*other)
    }
}

/// Unlabelled payload: every instance is equivalent to every other.
impl Equivalent for () {
    fn equivalent(&self, _other: &()) -> bool {
        true
    }
}
