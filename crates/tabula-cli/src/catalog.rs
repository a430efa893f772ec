//! Built-in resources: their schemas, default storage and seed data.

use clap::ValueEnum;
use serde_json::{Value, json};

use tabula_core::{FieldSpec, Schema};

/// Storage medium for a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    /// One pretty-printed JSON document per resource
    Json,
    /// One SQLite database per resource
    Sqlite,
}

impl Backend {
    fn extension(self) -> &'static str {
        match self {
            Backend::Json => "json",
            Backend::Sqlite => "db",
        }
    }
}

/// A resource served at `/<name>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
pub enum Resource {
    /// Tasks
    Tarefas,
    /// Products
    Produtos,
    /// Contacts
    Contatos,
    /// News articles (read-only over HTTP)
    Noticias,
}

impl Resource {
    pub const ALL: [Resource; 4] = [
        Resource::Tarefas,
        Resource::Produtos,
        Resource::Contatos,
        Resource::Noticias,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Resource::Tarefas => "tarefas",
            Resource::Produtos => "produtos",
            Resource::Contatos => "contatos",
            Resource::Noticias => "noticias",
        }
    }

    pub fn default_backend(self) -> Backend {
        match self {
            Resource::Produtos => Backend::Sqlite,
            _ => Backend::Json,
        }
    }

    /// Document file name for the given backend, e.g. `produtos.db`.
    pub fn file_name(self, backend: Backend) -> String {
        format!("{}.{}", self.name(), backend.extension())
    }

    pub fn schema(self) -> Schema {
        match self {
            Resource::Tarefas => Schema::new("tarefas", "Task")
                .field(FieldSpec::text("titulo").required())
                .field(FieldSpec::text("descricao"))
                .field(FieldSpec::boolean("concluida").default_value(json!(false)))
                .created_at("dataCriacao"),

            Resource::Produtos => Schema::new("produtos", "Product")
                .field(FieldSpec::text("nome").required().min_len(2).max_len(100))
                .field(FieldSpec::number("preco").required().min(0.0).max(999_999.99))
                .field(FieldSpec::text("descricao").max_len(500))
                .updated_at("updated_at"),

            Resource::Contatos => Schema::new("contatos", "Contact")
                .field(FieldSpec::text("nome").required())
                .field(FieldSpec::text("telefone").required())
                .field(FieldSpec::text("email").email().default_value(json!("")))
                .created_at("createdAt")
                .updated_at("updatedAt"),

            Resource::Noticias => Schema::new("noticias", "News article")
                .field(FieldSpec::text("titulo").required())
                .field(FieldSpec::text("conteudo").required())
                .field(FieldSpec::text("autor"))
                .field(FieldSpec::text("categoria"))
                .created_at("createdAt")
                .read_only(),
        }
    }

    /// Records created when the collection is first found empty.
    pub fn seeds(self) -> Vec<Value> {
        match self {
            Resource::Produtos => vec![
                json!({
                    "nome": "Camiseta Tech",
                    "preco": 59.9,
                    "descricao": "Camiseta 100% algodão premium"
                }),
                json!({
                    "nome": "Mouse Gamer X",
                    "preco": 129.0,
                    "descricao": "RGB, 6 botões programáveis"
                }),
                json!({
                    "nome": "Fone Bluetooth",
                    "preco": 199.9,
                    "descricao": "Cancelamento de ruído e estojo de carga"
                }),
            ],
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabula_core::{Mode, Validator};

    #[test]
    fn schema_resource_matches_name() {
        for resource in Resource::ALL {
            assert_eq!(resource.schema().resource(), resource.name());
        }
    }

    #[test]
    fn seeds_are_valid() {
        for resource in Resource::ALL {
            let schema = resource.schema();
            for seed in resource.seeds() {
                let violations = Validator::new(&schema).validate(&seed, Mode::Create);
                assert!(violations.is_empty(), "{}: {violations}", resource.name());
            }
        }
    }

    #[test]
    fn only_news_is_read_only() {
        let read_only: Vec<_> = Resource::ALL
            .into_iter()
            .filter(|r| r.schema().is_read_only())
            .collect();
        assert_eq!(read_only, [Resource::Noticias]);
    }

    #[test]
    fn file_names_follow_backend() {
        assert_eq!(Resource::Produtos.file_name(Backend::Sqlite), "produtos.db");
        assert_eq!(Resource::Tarefas.file_name(Backend::Json), "tarefas.json");
    }
}
