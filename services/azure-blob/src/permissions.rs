//! Capability sets granted by a Shared Access Signature.
//!
//! Every value here is a compile-time constant. There is no way to change a
//! published set at runtime; callers combine constants into new values.
//!
//! - [Container and blob permissions](https://learn.microsoft.com/en-us/rest/api/storageservices/create-service-sas#permissions-for-a-directory-container-or-blob)
//! - [Account permissions](https://learn.microsoft.com/en-us/rest/api/storageservices/create-account-sas#account-sas-permissions-by-operation)

use std::fmt::{Debug, Formatter};
use std::ops::BitOr;

/// A bitset over the capability flags a SAS can carry.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Permissions(u16);

impl Permissions {
    /// Read content, properties and metadata.
    pub const READ: Self = Self(1 << 0);
    /// Write content or metadata.
    pub const WRITE: Self = Self(1 << 1);
    /// List blobs or containers.
    pub const LIST: Self = Self(1 << 2);
    /// Delete blobs or containers.
    pub const DELETE: Self = Self(1 << 3);
    /// Append blocks.
    pub const ADD: Self = Self(1 << 4);
    /// Create new blobs.
    pub const CREATE: Self = Self(1 << 5);
    /// Read and write blob tags.
    pub const TAG: Self = Self(1 << 6);
    /// Update existing entities (account scope only).
    pub const UPDATE: Self = Self(1 << 7);
    /// Move or rename blobs.
    pub const MOVE: Self = Self(1 << 8);

    /// A set without any flag.
    pub const fn empty() -> Self {
        Self(0)
    }

    /// All flags of both sets.
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Flags set in both.
    pub const fn intersection(self, other: Self) -> Self {
        Self(self.0 & other.0)
    }

    /// Check if every flag of `other` is set.
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Check if no flag is set.
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for Permissions {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

impl Debug for Permissions {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let names = [
            (Self::READ, "read"),
            (Self::WRITE, "write"),
            (Self::LIST, "list"),
            (Self::DELETE, "delete"),
            (Self::ADD, "add"),
            (Self::CREATE, "create"),
            (Self::TAG, "tag"),
            (Self::UPDATE, "update"),
            (Self::MOVE, "move"),
        ];
        f.debug_set()
            .entries(
                names
                    .iter()
                    .filter(|(p, _)| self.contains(*p))
                    .map(|(_, n)| n),
            )
            .finish()
    }
}

/// The level a credential applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SasScope {
    /// A single object.
    Blob,
    /// A collection of objects.
    Container,
    /// The whole storage account.
    Account,
}

impl SasScope {
    /// Flags this scope understands, in the order the service expects them
    /// inside `sp=`.
    const fn letters(self) -> &'static [(Permissions, char)] {
        match self {
            SasScope::Blob => &[
                (Permissions::READ, 'r'),
                (Permissions::ADD, 'a'),
                (Permissions::CREATE, 'c'),
                (Permissions::WRITE, 'w'),
                (Permissions::DELETE, 'd'),
                (Permissions::TAG, 't'),
                (Permissions::MOVE, 'm'),
            ],
            SasScope::Container => &[
                (Permissions::READ, 'r'),
                (Permissions::ADD, 'a'),
                (Permissions::CREATE, 'c'),
                (Permissions::WRITE, 'w'),
                (Permissions::DELETE, 'd'),
                (Permissions::LIST, 'l'),
                (Permissions::TAG, 't'),
                (Permissions::MOVE, 'm'),
            ],
            SasScope::Account => &[
                (Permissions::READ, 'r'),
                (Permissions::WRITE, 'w'),
                (Permissions::DELETE, 'd'),
                (Permissions::LIST, 'l'),
                (Permissions::ADD, 'a'),
                (Permissions::CREATE, 'c'),
                (Permissions::UPDATE, 'u'),
                (Permissions::TAG, 't'),
            ],
        }
    }

    /// Every flag this scope understands.
    pub const fn vocabulary(self) -> Permissions {
        let letters = self.letters();
        let mut all = Permissions::empty();
        let mut i = 0;
        while i < letters.len() {
            all = all.union(letters[i].0);
            i += 1;
        }
        all
    }
}

/// Permissions bound to the scope whose vocabulary they are drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PermissionSet {
    scope: SasScope,
    permissions: Permissions,
}

impl PermissionSet {
    /// Bind `permissions` to `scope`.
    ///
    /// # Panics
    ///
    /// Panics if a flag is outside the scope's vocabulary. Used in constant
    /// position this is a compile error instead.
    pub const fn new(scope: SasScope, permissions: Permissions) -> Self {
        assert!(
            scope.vocabulary().contains(permissions),
            "permission outside scope vocabulary"
        );
        Self { scope, permissions }
    }

    /// The scope these permissions were drawn from.
    pub fn scope(&self) -> SasScope {
        self.scope
    }

    /// The raw flags.
    pub fn permissions(&self) -> Permissions {
        self.permissions
    }

    /// Render the flags for `sp=` as understood by `scope`.
    ///
    /// Flags the target scope does not know are dropped.
    pub fn to_sas_string_for(&self, scope: SasScope) -> String {
        scope
            .letters()
            .iter()
            .filter(|(p, _)| self.permissions.contains(*p))
            .map(|(_, c)| *c)
            .collect()
    }

    /// Render the flags for `sp=` in this set's own scope.
    pub fn to_sas_string(&self) -> String {
        self.to_sas_string_for(self.scope)
    }
}

/// Container-level capabilities.
pub const CONTAINER_PERMISSIONS: PermissionSet = PermissionSet::new(
    SasScope::Container,
    Permissions::READ
        .union(Permissions::WRITE)
        .union(Permissions::LIST)
        .union(Permissions::DELETE)
        .union(Permissions::ADD)
        .union(Permissions::CREATE)
        .union(Permissions::TAG)
        .union(Permissions::MOVE),
);

/// Blob-level capabilities.
pub const BLOB_PERMISSIONS: PermissionSet = PermissionSet::new(
    SasScope::Blob,
    Permissions::READ
        .union(Permissions::WRITE)
        .union(Permissions::DELETE)
        .union(Permissions::ADD)
        .union(Permissions::CREATE)
        .union(Permissions::TAG)
        .union(Permissions::MOVE),
);

/// Account-level capabilities.
pub const ACCOUNT_PERMISSIONS: PermissionSet = PermissionSet::new(
    SasScope::Account,
    Permissions::READ
        .union(Permissions::WRITE)
        .union(Permissions::LIST)
        .union(Permissions::DELETE)
        .union(Permissions::ADD)
        .union(Permissions::CREATE)
        .union(Permissions::TAG)
        .union(Permissions::UPDATE),
);

/// Storage services reachable with an account SAS (`ss=`).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Services(u8);

impl Services {
    /// Blob service.
    pub const BLOB: Self = Self(1 << 0);
    /// Queue service.
    pub const QUEUE: Self = Self(1 << 1);
    /// Table service.
    pub const TABLE: Self = Self(1 << 2);
    /// File service.
    pub const FILE: Self = Self(1 << 3);

    /// All services of both sets.
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Check if every service of `other` is set.
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Render for `ss=`.
    pub fn to_sas_string(&self) -> String {
        [
            (Self::BLOB, 'b'),
            (Self::QUEUE, 'q'),
            (Self::TABLE, 't'),
            (Self::FILE, 'f'),
        ]
        .iter()
        .filter(|(s, _)| self.contains(*s))
        .map(|(_, c)| *c)
        .collect()
    }
}

impl Debug for Services {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Services({})", self.to_sas_string())
    }
}

/// Resource types reachable with an account SAS (`srt=`).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceTypes(u8);

impl ResourceTypes {
    /// Service-level APIs such as listing containers.
    pub const SERVICE: Self = Self(1 << 0);
    /// Container-level APIs.
    pub const CONTAINER: Self = Self(1 << 1);
    /// Object-level APIs such as blob reads and writes.
    pub const OBJECT: Self = Self(1 << 2);

    /// All resource types of both sets.
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Check if every resource type of `other` is set.
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Render for `srt=`.
    pub fn to_sas_string(&self) -> String {
        [
            (Self::SERVICE, 's'),
            (Self::CONTAINER, 'c'),
            (Self::OBJECT, 'o'),
        ]
        .iter()
        .filter(|(r, _)| self.contains(*r))
        .map(|(_, c)| *c)
        .collect()
    }
}

impl Debug for ResourceTypes {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "ResourceTypes({})", self.to_sas_string())
    }
}

/// Services granted by account SAS tokens.
pub const ACCOUNT_SAS_SERVICES: Services = Services::BLOB.union(Services::FILE);

/// Resource types granted by account SAS tokens.
pub const ACCOUNT_SAS_RESOURCE_TYPES: ResourceTypes = ResourceTypes::SERVICE
    .union(ResourceTypes::CONTAINER)
    .union(ResourceTypes::OBJECT);
