#![forbid(unsafe_code)]

//! State updates: replace, shallow-merge, or transform.
//!
//! Which of the three applies is chosen explicitly by the caller through
//! [`Update`]. Merging needs a notion of "partial value", which a type opts
//! into by implementing [`Mergeable`]. Scalars and other opaque values use
//! [`Infallible`] as their patch type, so a merge of them cannot be
//! constructed at all.

use std::collections::{BTreeMap, HashMap};
use std::convert::Infallible;
use std::fmt;
use std::hash::{BuildHasher, Hash};

/// Values that can absorb a partial update.
///
/// `merge` must leave every part of `self` not named by the patch
/// unchanged.
///
/// # Example
///
/// ```
/// use atomkit_core::update::Mergeable;
///
/// #[derive(Clone, Debug, PartialEq)]
/// struct User {
///     name: Option<String>,
///     age: Option<u32>,
/// }
///
/// #[derive(Default)]
/// struct UserPatch {
///     name: Option<Option<String>>,
///     age: Option<Option<u32>>,
/// }
///
/// impl Mergeable for User {
///     type Patch = UserPatch;
///
///     fn merge(&mut self, patch: UserPatch) {
///         if let Some(name) = patch.name {
///             self.name = name;
///         }
///         if let Some(age) = patch.age {
///             self.age = age;
///         }
///     }
/// }
///
/// let mut user = User { name: None, age: Some(30) };
/// user.merge(UserPatch { name: Some(Some("Stad".into())), ..Default::default() });
/// assert_eq!(user, User { name: Some("Stad".into()), age: Some(30) });
/// ```
pub trait Mergeable {
    /// The partial form of `Self`.
    type Patch;

    /// Shallow-merge `patch` onto `self`.
    fn merge(&mut self, patch: Self::Patch);
}

/// Implement [`Mergeable`] for types that only support whole-value
/// replacement.
///
/// ```
/// #[derive(Clone)]
/// struct Token(u64);
///
/// atomkit_core::replace_only!(Token);
/// ```
#[macro_export]
macro_rules! replace_only {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::update::Mergeable for $ty {
                type Patch = ::std::convert::Infallible;

                fn merge(&mut self, patch: Self::Patch) {
                    match patch {}
                }
            }
        )+
    };
}

replace_only!(
    (),
    bool,
    char,
    i8,
    i16,
    i32,
    i64,
    i128,
    isize,
    u8,
    u16,
    u32,
    u64,
    u128,
    usize,
    f32,
    f64,
    String,
    &'static str,
);

impl<T> Mergeable for Option<T> {
    type Patch = Infallible;

    fn merge(&mut self, patch: Infallible) {
        match patch {}
    }
}

impl<T> Mergeable for Vec<T> {
    type Patch = Infallible;

    fn merge(&mut self, patch: Infallible) {
        match patch {}
    }
}

impl<T: ?Sized> Mergeable for Box<T> {
    type Patch = Infallible;

    fn merge(&mut self, patch: Infallible) {
        match patch {}
    }
}

/// Maps are records: a patch overwrites the keys it carries.
impl<K: Eq + Hash, V, S: BuildHasher> Mergeable for HashMap<K, V, S> {
    type Patch = HashMap<K, V>;

    fn merge(&mut self, patch: Self::Patch) {
        self.extend(patch);
    }
}

impl<K: Ord, V> Mergeable for BTreeMap<K, V> {
    type Patch = BTreeMap<K, V>;

    fn merge(&mut self, patch: Self::Patch) {
        self.extend(patch);
    }
}

/// A state transition, tagged by how it combines with the current value.
pub enum Update<T: Mergeable> {
    /// Discard the current value.
    Replace(T),
    /// Shallow-merge a partial value onto the current value.
    Merge(T::Patch),
    /// Compute the next value from the current one.
    Transform(Box<dyn FnOnce(&T) -> T>),
}

impl<T: Mergeable> Update<T> {
    pub fn replace(value: T) -> Self {
        Self::Replace(value)
    }

    pub fn merge(patch: T::Patch) -> Self {
        Self::Merge(patch)
    }

    pub fn transform(f: impl FnOnce(&T) -> T + 'static) -> Self {
        Self::Transform(Box::new(f))
    }

    /// Apply this update to `current`, producing the next value.
    ///
    /// `current` is owned so merges can happen in place.
    pub fn apply(self, mut current: T) -> T {
        match self {
            Self::Replace(value) => value,
            Self::Merge(patch) => {
                current.merge(patch);
                current
            }
            Self::Transform(f) => f(&current),
        }
    }

    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Self::Replace(_) => "replace",
            Self::Merge(_) => "merge",
            Self::Transform(_) => "transform",
        }
    }
}

impl<T: Mergeable> From<T> for Update<T> {
    fn from(value: T) -> Self {
        Self::Replace(value)
    }
}

impl<T: Mergeable> fmt::Debug for Update<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Update").field(&self.kind()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replace_discards_current() {
        assert_eq!(Update::replace(7).apply(3), 7);
        assert_eq!(Update::from("b".to_string()).apply("a".into()), "b");
    }

    #[test]
    fn transform_sees_current() {
        assert_eq!(Update::transform(|v: &i32| v * 10).apply(4), 40);
    }

    #[test]
    fn map_merge_keeps_other_keys() {
        let current = BTreeMap::from([("a", 1), ("b", 2)]);
        let next = Update::merge(BTreeMap::from([("b", 20), ("c", 30)])).apply(current);
        assert_eq!(next, BTreeMap::from([("a", 1), ("b", 20), ("c", 30)]));
    }

    #[test]
    fn hash_map_merge_overwrites_named_keys() {
        let mut current: HashMap<String, u8> = HashMap::new();
        current.insert("x".into(), 1);
        current.insert("y".into(), 2);
        current.merge(HashMap::from([("y".to_string(), 9)]));
        assert_eq!(current["x"], 1);
        assert_eq!(current["y"], 9);
    }

    #[test]
    fn option_replace_to_none() {
        let next = Update::<Option<u8>>::replace(None).apply(Some(3));
        assert_eq!(next, None);
    }

    #[derive(Clone)]
    struct Opaque(u8);
    crate::replace_only!(Opaque);

    #[test]
    fn replace_only_macro_for_user_types() {
        assert_eq!(Update::replace(Opaque(2)).apply(Opaque(1)).0, 2);
    }

    #[test]
    fn debug_names_variant() {
        assert_eq!(format!("{:?}", Update::replace(1u8)), "Update(\"replace\")");
        assert_eq!(
            format!("{:?}", Update::transform(|v: &u8| *v)),
            "Update(\"transform\")"
        );
    }
}
