use crate::object::ObjectId;

/// Domain-separated BLAKE3 content hasher.
///
/// Each hasher carries a domain tag (`"twig-blob-v1"`, `"twig-commit-v1"`)
/// that is prepended to every hash computation, so a blob and a commit with
/// identical field bytes never share an id.
///
/// Objects are hashed as a sequence of fields. Every field is framed with its
/// length, which keeps `("ab", "c")` and `("a", "bc")` apart.
pub struct ContentHasher {
    domain: &'static str,
}

impl ContentHasher {
    /// Hasher for blob objects.
    pub const BLOB: Self = Self {
        domain: "twig-blob-v1",
    };
    /// Hasher for commit objects.
    pub const COMMIT: Self = Self {
        domain: "twig-commit-v1",
    };

    /// Create a hasher with a custom domain tag.
    pub const fn new(domain: &'static str) -> Self {
        Self { domain }
    }

    /// Hash raw bytes as a single field.
    pub fn hash(&self, data: &[u8]) -> ObjectId {
        self.hash_fields([data])
    }

    /// Hash an ordered sequence of length-framed fields.
    pub fn hash_fields<'a, I>(&self, fields: I) -> ObjectId
    where
        I: IntoIterator<Item = &'a [u8]>,
    {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.domain.as_bytes());
        hasher.update(b":");
        for field in fields {
            hasher.update(&(field.len() as u64).to_le_bytes());
            hasher.update(field);
        }
        ObjectId::from_hash(*hasher.finalize().as_bytes())
    }

    /// The domain tag used by this hasher.
    pub fn domain(&self) -> &str {
        self.domain
    }
}
