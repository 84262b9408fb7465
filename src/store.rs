//! Document persistence on sled.
//!
//! The keyspace mirrors the browser storage the app grew up on: one JSON
//! record per document under `document_app_doc_<id>` plus a few scalar
//! preference keys, all in the default tree.

use chrono::{DateTime, Utc};
use rand::Rng;
use sled::Db;

use crate::error::{DocsError, Result};
use crate::models::{Document, DocumentData, Preferences, PreferencesUpdate, View, UNCATEGORIZED};

pub const DOC_KEY_PREFIX: &str = "document_app_doc_";
pub const LAST_OPENED_KEY: &str = "document_app_last_opened";
pub const AUTO_SAVE_KEY: &str = "document_app_auto_save_enabled";
pub const SIDEBAR_VISIBLE_KEY: &str = "document_app_sidebar_visible";
pub const LAST_VIEW_KEY: &str = "document_app_last_view";

/// Initial body of a freshly created document.
const NEW_DOCUMENT_BODY: &str = "<p>Comece a escrever seu novo documento aqui...</p>";

fn doc_key(id: &str) -> String {
    format!("{}{}", DOC_KEY_PREFIX, id)
}

#[derive(Clone)]
pub struct DocumentStore {
    db: Db,
}

impl DocumentStore {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &Db {
        &self.db
    }

    // ========================================================================
    // Raw access
    // ========================================================================

    fn get_str(&self, key: &str) -> Result<Option<String>> {
        Ok(self
            .db
            .get(key.as_bytes())?
            .map(|v| String::from_utf8_lossy(&v).into_owned()))
    }

    fn set_str(&self, key: &str, value: &str) -> Result<()> {
        self.db.insert(key.as_bytes(), value.as_bytes())?;
        Ok(())
    }

    fn write_document(&self, doc: &Document) -> Result<()> {
        let json = serde_json::to_vec(doc)?;
        self.db.insert(doc_key(&doc.id).as_bytes(), json)?;
        Ok(())
    }

    /// Decode one stored record. The key, not the body, decides the id.
    fn decode(key: &[u8], value: &[u8], now: DateTime<Utc>) -> Option<Document> {
        let key = String::from_utf8_lossy(key);
        let id = key.strip_prefix(DOC_KEY_PREFIX)?.to_string();
        match serde_json::from_slice::<DocumentData>(value) {
            Ok(data) => Some(data.into_document(id, now)),
            Err(e) => {
                tracing::warn!("Skipping unreadable document record {}: {}", key, e);
                None
            }
        }
    }

    // ========================================================================
    // Documents
    // ========================================================================

    /// Create or update a document.
    ///
    /// `created` is set once and never touched again. `lastModified` is
    /// bumped on every call and never moves backwards. Properties left as
    /// `None` keep their stored value.
    pub fn save_document(
        &self,
        id: &str,
        content: &str,
        name: Option<String>,
        category: Option<String>,
        tags: Option<Vec<String>>,
    ) -> Result<Document> {
        if id.trim().is_empty() {
            return Err(DocsError::InvalidInput("Document id is required".to_string()));
        }

        let now = Utc::now();
        let existing = self.load_document(id)?;

        let doc = match existing {
            Some(prev) => Document {
                id: prev.id,
                name: name.unwrap_or(prev.name),
                content: content.to_string(),
                category: category.unwrap_or(prev.category),
                tags: tags.unwrap_or(prev.tags),
                created: prev.created,
                last_modified: now.max(prev.last_modified),
            },
            None => Document {
                id: id.to_string(),
                name: name.unwrap_or_else(|| format!("Documento {}", now.timestamp_millis())),
                content: content.to_string(),
                category: category.unwrap_or_else(|| UNCATEGORIZED.to_string()),
                tags: tags.unwrap_or_default(),
                created: now,
                last_modified: now,
            },
        };

        self.write_document(&doc)?;
        self.set_last_opened(Some(&doc.id))?;
        tracing::debug!("Saved document {}", doc.id);
        Ok(doc)
    }

    pub fn load_document(&self, id: &str) -> Result<Option<Document>> {
        let key = doc_key(id);
        match self.db.get(key.as_bytes())? {
            Some(value) => Ok(Self::decode(key.as_bytes(), &value, Utc::now())),
            None => Ok(None),
        }
    }

    /// Every readable document, with defaults applied. Order is key order.
    pub fn list_documents(&self) -> Result<Vec<Document>> {
        let now = Utc::now();
        let mut docs = Vec::new();
        for entry in self.db.scan_prefix(DOC_KEY_PREFIX.as_bytes()) {
            let (key, value) = entry?;
            if let Some(doc) = Self::decode(&key, &value, now) {
                docs.push(doc);
            }
        }
        Ok(docs)
    }

    /// Stored records exactly as written, for backups.
    pub fn all_documents(&self) -> Result<Vec<serde_json::Value>> {
        let mut docs = Vec::new();
        for entry in self.db.scan_prefix(DOC_KEY_PREFIX.as_bytes()) {
            let (key, value) = entry?;
            match serde_json::from_slice(&value) {
                Ok(json) => docs.push(json),
                Err(e) => tracing::warn!(
                    "Skipping unreadable document record {} in export: {}",
                    String::from_utf8_lossy(&key),
                    e
                ),
            }
        }
        Ok(docs)
    }

    pub fn count_documents(&self) -> usize {
        self.db.scan_prefix(DOC_KEY_PREFIX.as_bytes()).count()
    }

    /// New blank document with id `doc-<millis>`. Becomes the last opened.
    pub fn create_document(
        &self,
        name: Option<String>,
        category: Option<String>,
        tags: Vec<String>,
    ) -> Result<Document> {
        let now = Utc::now();
        let id = self.fresh_id(&format!("doc-{}", now.timestamp_millis()))?;
        let name = name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| format!("Documento {}", self.count_documents() + 1));
        let category = category
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| UNCATEGORIZED.to_string());

        let doc = Document {
            id,
            content: format!("<h1>{}</h1>{}", crate::html::html_escape(&name), NEW_DOCUMENT_BODY),
            name,
            category,
            tags,
            created: now,
            last_modified: now,
        };
        self.write_document(&doc)?;
        self.set_last_opened(Some(&doc.id))?;
        tracing::info!("Created document {} ({})", doc.id, doc.name);
        Ok(doc)
    }

    /// Store a document coming from outside under a brand-new id.
    ///
    /// The incoming id is ignored so an import can never overwrite anything.
    pub fn import_document(&self, data: DocumentData) -> Result<Document> {
        let now = Utc::now();
        let id = self.fresh_id(&format!(
            "doc-imported-{}-{}",
            now.timestamp_millis(),
            random_base36(9)
        ))?;

        let name = data
            .name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| format!("Documento Importado {}", now.timestamp_millis()));
        let created = data
            .created
            .as_deref()
            .and_then(crate::models::iso8601::parse)
            .unwrap_or(now);

        let doc = Document {
            id,
            name,
            content: data.content.unwrap_or_default(),
            category: data
                .category
                .filter(|c| !c.trim().is_empty())
                .unwrap_or_else(|| UNCATEGORIZED.to_string()),
            tags: data.tags.unwrap_or_default(),
            created,
            last_modified: now,
        };
        self.write_document(&doc)?;
        tracing::info!("Imported document {} ({})", doc.id, doc.name);
        Ok(doc)
    }

    /// Returns whether a document was removed.
    pub fn delete_document(&self, id: &str) -> Result<bool> {
        let removed = self.db.remove(doc_key(id).as_bytes())?.is_some();
        if self.last_opened()?.as_deref() == Some(id) {
            self.set_last_opened(None)?;
        }
        if removed {
            tracing::info!("Deleted document {}", id);
        }
        Ok(removed)
    }

    /// Remove every document and forget the last opened one. Preferences stay.
    pub fn clear_all_documents(&self) -> Result<usize> {
        let keys: Vec<sled::IVec> = self
            .db
            .scan_prefix(DOC_KEY_PREFIX.as_bytes())
            .keys()
            .collect::<std::result::Result<_, _>>()?;
        for key in &keys {
            self.db.remove(key)?;
        }
        self.set_last_opened(None)?;
        tracing::info!("Cleared {} documents", keys.len());
        Ok(keys.len())
    }

    /// Rename, recategorise and retag a document without touching its content.
    pub fn update_properties(
        &self,
        id: &str,
        name: &str,
        category: &str,
        tags: Vec<String>,
    ) -> Result<Document> {
        let name = name.trim();
        if name.is_empty() {
            return Err(DocsError::InvalidInput(
                "O nome do documento não pode estar vazio".to_string(),
            ));
        }
        let doc = self
            .load_document(id)?
            .ok_or_else(|| DocsError::NotFound(id.to_string()))?;
        let category = match category.trim() {
            "" => UNCATEGORIZED.to_string(),
            c => c.to_string(),
        };
        self.save_document(id, &doc.content, Some(name.to_string()), Some(category), Some(tags))
    }

    /// Sorted unique categories across all documents.
    pub fn all_categories(&self) -> Result<Vec<String>> {
        let mut categories: Vec<String> = self
            .list_documents()?
            .iter()
            .map(|d| d.category_or_default().to_string())
            .collect();
        categories.sort();
        categories.dedup();
        Ok(categories)
    }

    /// Seed the sample documents, but only into an empty store.
    pub fn ensure_default_documents(&self) -> Result<bool> {
        if self.count_documents() > 0 {
            return Ok(false);
        }
        for (id, name, category, tags, content) in DEFAULT_DOCUMENTS {
            self.save_document(
                id,
                content,
                Some(name.to_string()),
                Some(category.to_string()),
                Some(tags.iter().map(|t| t.to_string()).collect()),
            )?;
        }
        self.set_last_opened(Some("my-first-document"))?;
        tracing::info!("Seeded {} sample documents", DEFAULT_DOCUMENTS.len());
        Ok(true)
    }

    fn fresh_id(&self, base: &str) -> Result<String> {
        let mut id = base.to_string();
        let mut n = 1;
        while self.db.contains_key(doc_key(&id).as_bytes())? {
            n += 1;
            id = format!("{}-{}", base, n);
        }
        Ok(id)
    }

    // ========================================================================
    // Last opened + preferences
    // ========================================================================

    pub fn last_opened(&self) -> Result<Option<String>> {
        Ok(self.get_str(LAST_OPENED_KEY)?.filter(|s| !s.is_empty()))
    }

    pub fn set_last_opened(&self, id: Option<&str>) -> Result<()> {
        match id {
            Some(id) => self.set_str(LAST_OPENED_KEY, id),
            None => {
                self.db.remove(LAST_OPENED_KEY.as_bytes())?;
                Ok(())
            }
        }
    }

    /// Only the literal `false` turns a flag off.
    fn get_flag(&self, key: &str) -> Result<bool> {
        Ok(self.get_str(key)?.as_deref() != Some("false"))
    }

    pub fn preferences(&self) -> Result<Preferences> {
        Ok(Preferences {
            auto_save_enabled: self.get_flag(AUTO_SAVE_KEY)?,
            sidebar_visible: self.get_flag(SIDEBAR_VISIBLE_KEY)?,
            last_view: self
                .get_str(LAST_VIEW_KEY)?
                .as_deref()
                .and_then(View::parse)
                .unwrap_or_default(),
        })
    }

    pub fn update_preferences(&self, update: PreferencesUpdate) -> Result<Preferences> {
        if let Some(enabled) = update.auto_save_enabled {
            self.set_str(AUTO_SAVE_KEY, if enabled { "true" } else { "false" })?;
        }
        if let Some(visible) = update.sidebar_visible {
            self.set_str(SIDEBAR_VISIBLE_KEY, if visible { "true" } else { "false" })?;
        }
        if let Some(view) = update.last_view {
            self.set_str(LAST_VIEW_KEY, view.as_str())?;
        }
        self.preferences()
    }

    pub fn set_last_view(&self, view: View) -> Result<()> {
        self.set_str(LAST_VIEW_KEY, view.as_str())
    }
}

/// Lowercase base-36 suffix, the shape `Math.random().toString(36)` produced.
fn random_base36(len: usize) -> String {
    const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect()
}

// ============================================================================
// Sample documents
// ============================================================================

type SampleDocument = (&'static str, &'static str, &'static str, &'static [&'static str], &'static str);

const DEFAULT_DOCUMENTS: &[SampleDocument] = &[
    (
        "my-first-document",
        "Meu Primeiro Documento",
        "Fluxos de Trabalho",
        &["introducao", "documentacao"],
        r#"<h1>Bem-vindo ao Seu Novo Documento!</h1>
<p>Comece a digitar para criar conteúdo incrível. Este editor oferece uma experiência de escrita limpa e focada.</p>
<h2>Principais Recursos</h2>
<ul>
<li><strong>Edição de Texto Rico:</strong> Negrito, itálico, sublinhado, criar listas e muito mais.</li>
<li><strong>Espaço de Trabalho Organizado:</strong> Gerencie facilmente seus documentos na barra lateral.</li>
<li><strong>Tema Escuro:</strong> Desfrute de uma experiência de visualização confortável.</li>
</ul>
<h3>Primeiros Passos</h3>
<p>Basta clicar em qualquer lugar nesta área e começar a escrever. Tente selecionar algum texto e pressionar <code>Ctrl+B</code> para deixá-lo em negrito.</p>
<pre><code>function helloWorld() {
    console.log("Olá, Docs!");
}</code></pre>
<p>Seus documentos são salvos automaticamente enquanto você escreve.</p>"#,
    ),
    (
        "project-alpha-notes",
        "Notas do Projeto Alpha",
        "Fluxos de Trabalho",
        &["projeto", "equipe"],
        r#"<h1>Projeto Alpha: Brainstorm Inicial</h1>
<p>Este documento contém nossas notas preliminares para o Projeto Alpha.</p>
<h2>Marcos</h2>
<ul>
<li>Fase 1: Pesquisa e conceituação</li>
<li>Fase 2: Desenvolvimento do protótipo</li>
<li>Fase 3: Teste de usuário e feedback</li>
</ul>
<h3>Membros da Equipe</h3>
<p>João Ninguém, Maria Silva, Alex Souza</p>"#,
    ),
    (
        "meeting-minutes-2024-07-20",
        "Ata da Reunião - 2024-07-20",
        "Fluxos de Trabalho",
        &["reuniao", "relatorio"],
        r#"<h1>Ata da Reunião: Sincronização do Produto</h1>
<p><strong>Data:</strong> 20 de julho de 2024</p>
<h2>Pontos de Discussão</h2>
<ul>
<li>Revisão do roteiro do terceiro trimestre.</li>
<li>Planejamento das tarefas do próximo sprint.</li>
</ul>"#,
    ),
    (
        "api-credentials-v1",
        "Credenciais de API V1",
        "Credenciais",
        &["api", "seguranca"],
        "<h1>Credenciais de API - Versão 1</h1><p>Armazene suas chaves de API com segurança aqui.</p>",
    ),
    (
        "daily-execution-log",
        "Registro de Execução Diária",
        "Execuções",
        &["log", "diario"],
        "<h1>Registro Diário - 2024-07-25</h1><p>Registro de execuções e resultados diários do sistema.</p>",
    ),
    (
        "onboarding-guide",
        "Guia de Integração de Novo Funcionário",
        "Recursos Humanos",
        &["rh", "integracao"],
        "<h1>Integração de Novo Funcionário</h1><p>Este guia descreve os passos para novos funcionários.</p>",
    ),
    (
        "marketing-strategy-2024",
        "Estratégia de Marketing 2024",
        "Marketing",
        &["estrategia", "campanha"],
        "<h1>Plano de Marketing 2024</h1><p>Principais iniciativas para os esforços de marketing do próximo ano.</p>",
    ),
];

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> DocumentStore {
        let db = sled::Config::new().temporary(true).open().unwrap();
        DocumentStore::new(db)
    }

    #[test]
    fn test_save_and_load() {
        let store = temp_store();
        let doc = store
            .save_document("a", "<p>hi</p>", Some("A".into()), None, None)
            .unwrap();
        assert_eq!(doc.category, UNCATEGORIZED);

        let loaded = store.load_document("a").unwrap().unwrap();
        assert_eq!(loaded, doc);
        assert_eq!(store.last_opened().unwrap().as_deref(), Some("a"));
    }

    #[test]
    fn test_created_is_immutable_and_last_modified_monotonic() {
        let store = temp_store();
        let first = store.save_document("a", "one", Some("A".into()), None, None).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(5));
        let second = store.save_document("a", "two", None, None, None).unwrap();

        assert_eq!(second.created, first.created);
        assert!(second.last_modified >= first.last_modified);
        assert_eq!(second.name, "A");
        assert_eq!(second.content, "two");
    }

    #[test]
    fn test_save_keeps_properties_when_omitted() {
        let store = temp_store();
        store
            .save_document("a", "x", Some("A".into()), Some("Cat".into()), Some(vec!["t".into()]))
            .unwrap();
        let doc = store.save_document("a", "y", None, None, None).unwrap();
        assert_eq!(doc.category, "Cat");
        assert_eq!(doc.tags, vec!["t"]);
    }

    #[test]
    fn test_create_document_defaults() {
        let store = temp_store();
        let doc = store.create_document(None, None, vec![]).unwrap();
        assert!(doc.id.starts_with("doc-"));
        assert_eq!(doc.name, "Documento 1");
        assert_eq!(doc.category, UNCATEGORIZED);
        assert!(doc.content.starts_with("<h1>Documento 1</h1>"));
        assert_eq!(doc.created, doc.last_modified);
        assert_eq!(store.last_opened().unwrap(), Some(doc.id.clone()));
    }

    #[test]
    fn test_create_document_ids_are_unique() {
        let store = temp_store();
        let a = store.create_document(Some("A".into()), None, vec![]).unwrap();
        let b = store.create_document(Some("B".into()), None, vec![]).unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(store.list_documents().unwrap().len(), 2);
    }

    #[test]
    fn test_import_document_assigns_new_id() {
        let store = temp_store();
        let data = DocumentData {
            id: Some("a".into()),
            name: Some("Imported".into()),
            content: Some("<p>x</p>".into()),
            created: Some("2020-01-01T00:00:00.000Z".into()),
            ..Default::default()
        };
        let doc = store.import_document(data).unwrap();
        assert!(doc.id.starts_with("doc-imported-"));
        let suffix = doc.id.rsplit('-').next().unwrap();
        assert_eq!(suffix.len(), 9);
        assert_eq!(crate::models::iso8601::format(&doc.created), "2020-01-01T00:00:00.000Z");
        assert!(doc.last_modified > doc.created);
    }

    #[test]
    fn test_delete_clears_last_opened() {
        let store = temp_store();
        store.save_document("a", "x", None, None, None).unwrap();
        assert!(store.delete_document("a").unwrap());
        assert!(store.last_opened().unwrap().is_none());
        assert!(!store.delete_document("a").unwrap());
    }

    #[test]
    fn test_corrupt_entries_are_skipped() {
        let store = temp_store();
        store.save_document("good", "x", None, None, None).unwrap();
        store.db().insert(doc_key("bad").as_bytes(), b"{not json".to_vec()).unwrap();

        let docs = store.list_documents().unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].id, "good");
        assert_eq!(store.all_documents().unwrap().len(), 1);
    }

    #[test]
    fn test_legacy_record_gets_defaults() {
        let store = temp_store();
        store
            .db()
            .insert(
                doc_key("old").as_bytes(),
                br#"{"id":"old","name":"Old","lastModified":"2022-05-01T10:00:00.000Z"}"#.to_vec(),
            )
            .unwrap();
        let doc = store.load_document("old").unwrap().unwrap();
        assert_eq!(doc.category, UNCATEGORIZED);
        assert!(doc.tags.is_empty());
        assert_eq!(doc.created, doc.last_modified);
    }

    #[test]
    fn test_clear_all_keeps_preferences() {
        let store = temp_store();
        store.save_document("a", "x", None, None, None).unwrap();
        store.save_document("b", "y", None, None, None).unwrap();
        store
            .update_preferences(PreferencesUpdate {
                auto_save_enabled: Some(false),
                ..Default::default()
            })
            .unwrap();

        assert_eq!(store.clear_all_documents().unwrap(), 2);
        assert!(store.list_documents().unwrap().is_empty());
        assert!(store.last_opened().unwrap().is_none());
        assert!(!store.preferences().unwrap().auto_save_enabled);
    }

    #[test]
    fn test_categories_sorted_unique() {
        let store = temp_store();
        store.save_document("a", "", None, Some("Marketing".into()), None).unwrap();
        store.save_document("b", "", None, Some("Credenciais".into()), None).unwrap();
        store.save_document("c", "", None, Some("Marketing".into()), None).unwrap();
        assert_eq!(store.all_categories().unwrap(), vec!["Credenciais", "Marketing"]);
    }

    #[test]
    fn test_ensure_defaults_only_when_empty() {
        let store = temp_store();
        assert!(store.ensure_default_documents().unwrap());
        assert_eq!(store.count_documents(), DEFAULT_DOCUMENTS.len());
        assert_eq!(store.last_opened().unwrap().as_deref(), Some("my-first-document"));
        assert!(!store.ensure_default_documents().unwrap());

        let other = temp_store();
        other.save_document("mine", "x", None, None, None).unwrap();
        assert!(!other.ensure_default_documents().unwrap());
        assert_eq!(other.count_documents(), 1);
    }

    #[test]
    fn test_update_properties() {
        let store = temp_store();
        store.save_document("a", "<p>body</p>", Some("A".into()), None, None).unwrap();

        let doc = store
            .update_properties("a", "  Novo  ", "", vec!["x".into()])
            .unwrap();
        assert_eq!(doc.name, "Novo");
        assert_eq!(doc.category, UNCATEGORIZED);
        assert_eq!(doc.content, "<p>body</p>");

        assert!(matches!(
            store.update_properties("a", "   ", "", vec![]),
            Err(DocsError::InvalidInput(_))
        ));
        assert!(matches!(
            store.update_properties("missing", "N", "", vec![]),
            Err(DocsError::NotFound(_))
        ));
    }

    #[test]
    fn test_preferences_defaults_and_false_literal() {
        let store = temp_store();
        assert_eq!(store.preferences().unwrap(), Preferences::default());

        store.db().insert(SIDEBAR_VISIBLE_KEY, "no").unwrap();
        assert!(store.preferences().unwrap().sidebar_visible);

        store.db().insert(SIDEBAR_VISIBLE_KEY, "false").unwrap();
        assert!(!store.preferences().unwrap().sidebar_visible);

        store.set_last_view(View::Import).unwrap();
        assert_eq!(store.preferences().unwrap().last_view, View::Import);
    }
}
