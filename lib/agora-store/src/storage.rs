/// String-keyed blob storage the store persists its collections into.
///
/// Values are JSON documents. The store only ever reads and overwrites keys, it never deletes them.
pub trait Storage {
    type Error: 'static + std::error::Error + Send + Sync;

    fn get(&self, key: &str) -> Result<Option<String>, Self::Error>;
    fn set(&self, key: &str, value: &str) -> Result<(), Self::Error>;
}

impl<S: Storage> Storage for &S {
    type Error = S::Error;

    fn get(&self, key: &str) -> Result<Option<String>, Self::Error> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), Self::Error> {
        (**self).set(key, value)
    }
}
