//! Database schema, migrations, and query builders.
//!
//! Every builder returns a [`Built`] pair for the server's rusqlite adapter.
//! Builders over tenant-owned tables take the `instituicao_id` they are
//! scoped to; rows of another institution are never visible through them.

pub mod avaliacoes;
pub mod aulas;
pub mod biblioteca;
pub mod calendario;
pub mod documentos;
pub mod estrutura;
pub mod financeiro;
pub mod instituicoes;
pub mod matriculas;
pub mod migrations;
pub mod planos;
pub mod relatorios;
pub mod rh;
pub mod tables;
pub mod turmas;
pub mod users;

// Re-export tables for convenience
pub use tables::*;

/// SQL text plus bound values.
pub type Built = (String, sea_query::Values);
