//! The user-facing shell: lifecycle operations over the namespace mirror.

use crate::backup::{BackupMetadata, BackupService, FileBackup, RestoreStats};
use crate::collection::Collection;
use crate::config::ShellConfig;
use crate::database::Database;
use crate::error::{CoreError, CoreResult};
use crate::name::validate_name;
use crate::namespace::Namespace;
use crate::outcome::{
    invalid_collection_name, invalid_database_name, Created, Outcome, Removed, Report,
    CREATE_NEEDS_DATABASE, REMOVE_NEEDS_DATABASE, SCHEMA_REQUIRED,
};
use crate::schema::{DirectorySchemaLoader, SchemaLoader, SchemaSource};
use crate::security::{CredentialStore, FileCredentials};
use crate::view::{Presenter, TerminalPresenter};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};
use yudb_storage::{FileEngine, StorageEngine};
use zeroize::Zeroizing;

/// The entry point of YuDB.
///
/// A `Shell` owns the namespace mirror and the collaborators the lifecycle
/// operations orchestrate. Every create or remove talks to the engine
/// first and patches the mirror only once the engine call succeeded, so a
/// failing engine never leaves the mirror ahead of it.
///
/// # Example
///
/// ```rust,ignore
/// use yudb_core::{Shell, ShellConfig, all};
/// use serde_json::json;
///
/// let mut shell = Shell::open(&ShellConfig::new("./data"))?;
/// shell.create(Some("shop"), None, None)?;
/// shell.create(Some("shop"), Some("items"), Some(json!({}).into()))?;
///
/// let items = shell.collection("shop", "items").unwrap();
/// items.add(&[json!({"sku": "a1"})])?;
/// let everything = items.read(all)?;
/// ```
pub struct Shell {
    engine: Arc<dyn StorageEngine>,
    namespace: Namespace,
    backup: Box<dyn BackupService>,
    credentials: Box<dyn CredentialStore>,
    presenter: Box<dyn Presenter>,
    schemas: Box<dyn SchemaLoader>,
}

impl Shell {
    /// Opens the file-backed stack described by `config`.
    ///
    /// The engine directory is locked for the life of the shell.
    pub fn open(config: &ShellConfig) -> CoreResult<Self> {
        info!(path = %config.data_dir.display(), "opening shell");
        let engine: Arc<dyn StorageEngine> =
            Arc::new(FileEngine::open(&config.data_dir, config.create_if_missing)?);

        ShellBuilder::new(Arc::clone(&engine))
            .backup(FileBackup::new(engine, &config.backup_path))
            .credentials(FileCredentials::open(&config.credentials_path)?)
            .presenter(TerminalPresenter::new())
            .schema_loader(DirectorySchemaLoader::new(&config.schema_dir))
            .build()
    }

    /// Starts building a shell over `engine`.
    pub fn builder(engine: Arc<dyn StorageEngine>) -> ShellBuilder {
        ShellBuilder::new(engine)
    }

    /// Returns the storage engine.
    pub fn engine(&self) -> &Arc<dyn StorageEngine> {
        &self.engine
    }

    /// Returns the namespace mirror.
    #[must_use]
    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    /// Returns the mirrored database handle.
    #[must_use]
    pub fn database(&self, name: &str) -> Option<&Database> {
        self.namespace.database(name)
    }

    /// Returns the mirrored collection handle.
    #[must_use]
    pub fn collection(&self, database: &str, collection: &str) -> Option<&Collection> {
        self.namespace.collection(database, collection)
    }

    /// Rebuilds the whole mirror from the engine.
    pub fn reload(&mut self) -> CoreResult<()> {
        self.namespace.reload(&self.engine)?;
        info!(databases = self.namespace.len(), "namespace reloaded");
        Ok(())
    }

    /// Lists database names, or the collections of `database`.
    ///
    /// Always asks the engine; the mirror is not consulted.
    pub fn ls(&self, database: Option<&str>) -> CoreResult<Vec<String>> {
        let names = match database {
            None => self.engine.list_databases()?,
            Some(database) => self.engine.list_collections(database)?,
        };
        Ok(names)
    }

    /// Creates a database, or a collection when `collection` is given.
    ///
    /// Missing arguments and invalid names are refused with a message and
    /// never reach the engine. A collection needs a schema; a named schema
    /// is resolved through the configured [`SchemaLoader`].
    pub fn create(
        &mut self,
        database: Option<&str>,
        collection: Option<&str>,
        schema: Option<SchemaSource>,
    ) -> CoreResult<Outcome<Created>> {
        let Some(database) = database else {
            return Ok(Outcome::message(CREATE_NEEDS_DATABASE));
        };
        match (collection, schema) {
            (None, _) => self.create_database(database),
            (Some(collection), Some(schema)) => {
                self.create_collection(database, collection, schema)
            }
            (Some(_), None) => Ok(Outcome::message(SCHEMA_REQUIRED)),
        }
    }

    /// Creates a database.
    pub fn create_database(&mut self, database: &str) -> CoreResult<Outcome<Created>> {
        if !validate_name(database) {
            return Ok(Outcome::message(invalid_database_name(database)));
        }

        self.engine.create_database(database)?;
        self.namespace.insert(Database::open(&self.engine, database)?);

        info!(database, "created database");
        Ok(Outcome::Done(Created {
            created: database.to_string(),
        }))
    }

    /// Creates a collection in an existing database.
    pub fn create_collection(
        &mut self,
        database: &str,
        collection: &str,
        schema: SchemaSource,
    ) -> CoreResult<Outcome<Created>> {
        if !validate_name(database) {
            return Ok(Outcome::message(invalid_database_name(database)));
        }
        if !validate_name(collection) {
            return Ok(Outcome::message(invalid_collection_name(collection)));
        }

        let schema = match schema {
            SchemaSource::Inline(value) => value,
            SchemaSource::Named(name) => {
                debug!(schema = %name, "resolving named schema");
                self.schemas.load(&name)?
            }
        };
        let encoded = serde_json::to_string(&schema)?;

        self.engine.create_collection(database, collection, &encoded)?;
        let mut handle = Database::open(&self.engine, database)?;
        handle.insert_collection(Collection::new(
            Arc::clone(&self.engine),
            database,
            collection,
        ));
        self.namespace.insert(handle);

        info!(database, collection, "created collection");
        Ok(Outcome::Done(Created {
            created: format!("{database}/{collection}"),
        }))
    }

    /// Removes a database, or one of its collections when `collection` is
    /// given.
    ///
    /// Existence is not checked locally; the engine decides.
    pub fn remove(
        &mut self,
        database: Option<&str>,
        collection: Option<&str>,
    ) -> CoreResult<Outcome<Removed>> {
        let Some(database) = database else {
            return Ok(Outcome::message(REMOVE_NEEDS_DATABASE));
        };
        match collection {
            None => self.remove_database(database),
            Some(collection) => self.remove_collection(database, collection),
        }
    }

    /// Removes a database.
    pub fn remove_database(&mut self, database: &str) -> CoreResult<Outcome<Removed>> {
        self.engine.delete_database(database)?;
        self.namespace.remove(database);

        info!(database, "removed database");
        Ok(Outcome::Done(Removed {
            deleted: database.to_string(),
        }))
    }

    /// Removes a collection.
    pub fn remove_collection(
        &mut self,
        database: &str,
        collection: &str,
    ) -> CoreResult<Outcome<Removed>> {
        self.engine.delete_collection(database, collection)?;
        if let Some(handle) = self.namespace.database_mut(database) {
            handle.remove_collection(collection);
        }

        info!(database, collection, "removed collection");
        Ok(Outcome::Done(Removed {
            deleted: format!("{database}/{collection}"),
        }))
    }

    /// Takes a backup of the engine.
    pub fn backup(&self) -> CoreResult<BackupMetadata> {
        self.backup.backup()
    }

    /// Restores the last backup, then rebuilds the mirror.
    pub fn restore(&mut self) -> CoreResult<RestoreStats> {
        let stats = self.backup.restore()?;
        self.reload()?;
        Ok(stats)
    }

    /// Clears the screen.
    pub fn clear(&self) -> CoreResult<()> {
        self.presenter.clear()
    }

    /// Prompts for a new username and applies it.
    pub fn change_username(&self) -> CoreResult<Report> {
        let answer = self.presenter.prompt_username()?;
        match self.credentials.change_username(&answer)? {
            Some(username) => {
                info!(%username, "username changed");
                Ok(Report::new(format!(
                    "Username was changed successfully to '{username}'"
                )))
            }
            None => Ok(Report::new("Username was not changed")),
        }
    }

    /// Prompts for the current and a new password and applies the change.
    pub fn change_password(&self) -> CoreResult<Report> {
        let (old, new): (Zeroizing<String>, Zeroizing<String>) =
            self.presenter.prompt_password_change()?;
        if self.credentials.change_password(&old, &new)? {
            info!("password changed");
            Ok(Report::new("Password was changed successfully"))
        } else {
            Ok(Report::new(
                "Password was not changed because the old password is incorrect",
            ))
        }
    }
}

impl fmt::Debug for Shell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Shell")
            .field("namespace", &self.namespace)
            .finish_non_exhaustive()
    }
}

/// Assembles a [`Shell`] from its collaborators.
///
/// Collaborators left unset fail with [`CoreError::NotConfigured`] when an
/// operation needs them. Named schemas default to files in the working
/// directory.
pub struct ShellBuilder {
    engine: Arc<dyn StorageEngine>,
    backup: Option<Box<dyn BackupService>>,
    credentials: Option<Box<dyn CredentialStore>>,
    presenter: Option<Box<dyn Presenter>>,
    schemas: Option<Box<dyn SchemaLoader>>,
}

impl ShellBuilder {
    /// Creates a builder over `engine`.
    pub fn new(engine: Arc<dyn StorageEngine>) -> Self {
        Self {
            engine,
            backup: None,
            credentials: None,
            presenter: None,
            schemas: None,
        }
    }

    /// Sets the backup subsystem.
    #[must_use]
    pub fn backup(mut self, backup: impl BackupService + 'static) -> Self {
        self.backup = Some(Box::new(backup));
        self
    }

    /// Sets the credential subsystem.
    #[must_use]
    pub fn credentials(mut self, credentials: impl CredentialStore + 'static) -> Self {
        self.credentials = Some(Box::new(credentials));
        self
    }

    /// Sets the presentation layer.
    #[must_use]
    pub fn presenter(mut self, presenter: impl Presenter + 'static) -> Self {
        self.presenter = Some(Box::new(presenter));
        self
    }

    /// Sets the named-schema loader.
    #[must_use]
    pub fn schema_loader(mut self, schemas: impl SchemaLoader + 'static) -> Self {
        self.schemas = Some(Box::new(schemas));
        self
    }

    /// Builds the shell and loads the namespace from the engine.
    pub fn build(self) -> CoreResult<Shell> {
        let namespace = Namespace::load(&self.engine)?;
        info!(databases = namespace.len(), "namespace loaded");

        Ok(Shell {
            engine: self.engine,
            namespace,
            backup: self.backup.unwrap_or_else(|| Box::new(Unconfigured)),
            credentials: self.credentials.unwrap_or_else(|| Box::new(Unconfigured)),
            presenter: self.presenter.unwrap_or_else(|| Box::new(Unconfigured)),
            schemas: self
                .schemas
                .unwrap_or_else(|| Box::new(DirectorySchemaLoader::new("."))),
        })
    }
}

/// Stand-in for a collaborator that was not configured.
struct Unconfigured;

impl BackupService for Unconfigured {
    fn backup(&self) -> CoreResult<BackupMetadata> {
        Err(CoreError::NotConfigured { subsystem: "backup" })
    }

    fn restore(&self) -> CoreResult<RestoreStats> {
        Err(CoreError::NotConfigured { subsystem: "backup" })
    }
}

impl CredentialStore for Unconfigured {
    fn change_username(&self, _new_username: &str) -> CoreResult<Option<String>> {
        Err(CoreError::NotConfigured {
            subsystem: "credential",
        })
    }

    fn change_password(&self, _old_password: &str, _new_password: &str) -> CoreResult<bool> {
        Err(CoreError::NotConfigured {
            subsystem: "credential",
        })
    }
}

impl Presenter for Unconfigured {
    fn clear(&self) -> CoreResult<()> {
        Err(CoreError::NotConfigured {
            subsystem: "presentation",
        })
    }

    fn prompt_username(&self) -> CoreResult<String> {
        Err(CoreError::NotConfigured {
            subsystem: "presentation",
        })
    }

    fn prompt_password_change(&self) -> CoreResult<(Zeroizing<String>, Zeroizing<String>)> {
        Err(CoreError::NotConfigured {
            subsystem: "presentation",
        })
    }
}
