// ABOUTME: Concrete setting kinds: enumerated, packed color, plain, and encrypted string
// ABOUTME: Each maps one domain type onto an integer or string primitive

use std::fmt;
use std::marker::PhantomData;

use async_trait::async_trait;
use latchkey_storage::{EncryptedKeyValueStore, KeyValueStore, StorageResult};

use crate::error::{SettingError, SettingResult};
use crate::setting::{Setting, SettingKind};
use crate::types::Color;

/// Enum persisted by its position in `VARIANTS`
pub trait OrdinalEnum: Copy + PartialEq + fmt::Debug + Send + Sync + 'static {
    const VARIANTS: &'static [Self];

    fn ordinal(&self) -> usize;
}

/// Enumerated value stored as its ordinal
pub struct EnumKind<E>(PhantomData<fn() -> E>);

impl<E> Default for EnumKind<E> {
    fn default() -> Self {
        Self(PhantomData)
    }
}

#[async_trait]
impl<E: OrdinalEnum> SettingKind for EnumKind<E> {
    type Domain = E;
    type Stored = i64;
    type Store = dyn KeyValueStore;

    fn access(&self, value: &E) -> i64 {
        value.ordinal() as i64
    }

    fn convert(&self, stored: i64) -> SettingResult<E> {
        usize::try_from(stored)
            .ok()
            .and_then(|index| E::VARIANTS.get(index))
            .copied()
            .ok_or(SettingError::InvalidOrdinal {
                ordinal: stored,
                type_name: std::any::type_name::<E>(),
                len: E::VARIANTS.len(),
            })
    }

    fn valid(&self, stored: &i64) -> bool {
        usize::try_from(*stored).is_ok_and(|index| index < E::VARIANTS.len())
    }

    async fn read_primitive(
        &self,
        store: &Self::Store,
        key: &str,
    ) -> StorageResult<Option<i64>> {
        store.get_int(key).await
    }

    async fn write_primitive(
        &self,
        store: &Self::Store,
        key: &str,
        value: i64,
    ) -> StorageResult<bool> {
        store.set_int(key, value).await
    }
}

/// ARGB color stored as a non-negative integer
#[derive(Debug, Default, Clone, Copy)]
pub struct ColorKind;

#[async_trait]
impl SettingKind for ColorKind {
    type Domain = Color;
    type Stored = i64;
    type Store = dyn KeyValueStore;

    fn access(&self, value: &Color) -> i64 {
        i64::from(value.argb())
    }

    fn convert(&self, stored: i64) -> SettingResult<Color> {
        u32::try_from(stored)
            .map(Color::from_argb)
            .map_err(|_| SettingError::ColorOutOfRange(stored))
    }

    fn valid(&self, stored: &i64) -> bool {
        (0..=i64::from(u32::MAX)).contains(stored)
    }

    async fn read_primitive(
        &self,
        store: &Self::Store,
        key: &str,
    ) -> StorageResult<Option<i64>> {
        store.get_int(key).await
    }

    async fn write_primitive(
        &self,
        store: &Self::Store,
        key: &str,
        value: i64,
    ) -> StorageResult<bool> {
        store.set_int(key, value).await
    }
}

/// Primitive types the plain store persists directly
#[async_trait]
pub trait PlainPrimitive: Clone + PartialEq + fmt::Debug + Send + Sync + 'static {
    async fn read(store: &dyn KeyValueStore, key: &str) -> StorageResult<Option<Self>>;

    async fn write(store: &dyn KeyValueStore, key: &str, value: Self) -> StorageResult<bool>;
}

#[async_trait]
impl PlainPrimitive for i64 {
    async fn read(store: &dyn KeyValueStore, key: &str) -> StorageResult<Option<Self>> {
        store.get_int(key).await
    }

    async fn write(store: &dyn KeyValueStore, key: &str, value: Self) -> StorageResult<bool> {
        store.set_int(key, value).await
    }
}

#[async_trait]
impl PlainPrimitive for String {
    async fn read(store: &dyn KeyValueStore, key: &str) -> StorageResult<Option<Self>> {
        store.get_string(key).await
    }

    async fn write(store: &dyn KeyValueStore, key: &str, value: Self) -> StorageResult<bool> {
        store.set_string(key, &value).await
    }
}

/// Domain and stored types coincide; every stored value is accepted
pub struct PlainKind<T>(PhantomData<fn() -> T>);

impl<T> Default for PlainKind<T> {
    fn default() -> Self {
        Self(PhantomData)
    }
}

#[async_trait]
impl<T: PlainPrimitive> SettingKind for PlainKind<T> {
    type Domain = T;
    type Stored = T;
    type Store = dyn KeyValueStore;

    fn access(&self, value: &T) -> T {
        value.clone()
    }

    fn convert(&self, stored: T) -> SettingResult<T> {
        Ok(stored)
    }

    fn valid(&self, _stored: &T) -> bool {
        true
    }

    async fn read_primitive(&self, store: &Self::Store, key: &str) -> StorageResult<Option<T>> {
        T::read(store, key).await
    }

    async fn write_primitive(
        &self,
        store: &Self::Store,
        key: &str,
        value: T,
    ) -> StorageResult<bool> {
        T::write(store, key, value).await
    }
}

/// String kept in the encrypted store.
///
/// The encrypted backend cannot tell "missing" from "empty", so an empty read
/// is reported as missing and the setting falls back to its current value.
#[derive(Debug, Default, Clone, Copy)]
pub struct SecretKind;

#[async_trait]
impl SettingKind for SecretKind {
    type Domain = String;
    type Stored = String;
    type Store = dyn EncryptedKeyValueStore;

    fn access(&self, value: &String) -> String {
        value.clone()
    }

    fn convert(&self, stored: String) -> SettingResult<String> {
        Ok(stored)
    }

    fn valid(&self, _stored: &String) -> bool {
        true
    }

    fn is_sensitive(&self) -> bool {
        true
    }

    async fn read_primitive(
        &self,
        store: &Self::Store,
        key: &str,
    ) -> StorageResult<Option<String>> {
        let value = store.get_string(key).await?;
        Ok((!value.is_empty()).then_some(value))
    }

    async fn write_primitive(
        &self,
        store: &Self::Store,
        key: &str,
        value: String,
    ) -> StorageResult<bool> {
        store.set_string(key, &value).await
    }
}

pub type EnumSetting<E> = Setting<EnumKind<E>>;
pub type ColorSetting = Setting<ColorKind>;
pub type IntSetting = Setting<PlainKind<i64>>;
pub type StringSetting = Setting<PlainKind<String>>;
pub type SecretSetting = Setting<SecretKind>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ThemeMode;
    use latchkey_storage::MemorySecureStore;
    use rstest::rstest;

    #[rstest]
    #[case(ThemeMode::System)]
    #[case(ThemeMode::Light)]
    #[case(ThemeMode::Dark)]
    fn test_enum_roundtrip(#[case] mode: ThemeMode) {
        let kind = EnumKind::<ThemeMode>::default();
        let stored = kind.access(&mode);
        assert!(kind.valid(&stored));
        assert_eq!(kind.convert(stored).unwrap(), mode);
    }

    #[rstest]
    #[case(0, true)]
    #[case(2, true)]
    #[case(3, false)]
    #[case(-1, false)]
    #[case(i64::MAX, false)]
    fn test_enum_valid_range(#[case] ordinal: i64, #[case] expected: bool) {
        assert_eq!(EnumKind::<ThemeMode>::default().valid(&ordinal), expected);
    }

    #[test]
    fn test_enum_convert_out_of_range_is_error() {
        let result = EnumKind::<ThemeMode>::default().convert(7);
        assert!(matches!(
            result,
            Err(SettingError::InvalidOrdinal { ordinal: 7, len: 3, .. })
        ));
    }

    #[rstest]
    #[case(0x0000_0000)]
    #[case(0xFF3F_51B5)]
    #[case(0xFFFF_FFFF)]
    fn test_color_roundtrip(#[case] argb: u32) {
        let color = Color::from_argb(argb);
        let stored = ColorKind.access(&color);
        assert!(stored >= 0);
        assert!(ColorKind.valid(&stored));
        assert_eq!(ColorKind.convert(stored).unwrap(), color);
    }

    #[rstest]
    #[case(0, true)]
    #[case(0xFFFF_FFFF, true)]
    #[case(-1, false)]
    #[case(0x1_0000_0000, false)]
    #[case(i64::MIN, false)]
    fn test_color_valid_boundary(#[case] stored: i64, #[case] expected: bool) {
        assert_eq!(ColorKind.valid(&stored), expected);
    }

    #[test]
    fn test_color_convert_out_of_range_is_error() {
        assert!(matches!(
            ColorKind.convert(-5),
            Err(SettingError::ColorOutOfRange(-5))
        ));
    }

    #[test]
    fn test_plain_roundtrip_and_always_valid() {
        let ints = PlainKind::<i64>::default();
        for value in [i64::MIN, -1, 0, 1, i64::MAX] {
            assert!(ints.valid(&value));
            assert_eq!(ints.convert(ints.access(&value)).unwrap(), value);
        }

        let strings = PlainKind::<String>::default();
        for value in ["", "latchkey", "mqtts://broker:8883"] {
            let value = value.to_string();
            assert!(strings.valid(&value));
            assert_eq!(strings.convert(strings.access(&value)).unwrap(), value);
        }
    }

    #[test]
    fn test_secret_roundtrip_and_sensitive() {
        let value = "s3cret".to_string();
        assert!(SecretKind.valid(&value));
        assert_eq!(SecretKind.convert(SecretKind.access(&value)).unwrap(), value);
        assert!(SecretKind.is_sensitive());
        assert!(!ColorKind.is_sensitive());
    }

    #[tokio::test]
    async fn test_secret_read_maps_empty_to_missing() {
        let store = MemorySecureStore::new();

        assert_eq!(
            SecretKind.read_primitive(&store, "credential_username").await.unwrap(),
            None
        );

        store.set_string("credential_username", "").await.unwrap();
        assert_eq!(
            SecretKind.read_primitive(&store, "credential_username").await.unwrap(),
            None
        );

        store.set_string("credential_username", "admin").await.unwrap();
        assert_eq!(
            SecretKind
                .read_primitive(&store, "credential_username")
                .await
                .unwrap()
                .as_deref(),
            Some("admin")
        );
    }
}
