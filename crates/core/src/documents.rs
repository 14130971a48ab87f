//! Official document numbering.

text_enum! {
    pub enum TipoDocumento {
        DeclaracaoMatricula => "DECLARACAO_MATRICULA",
        Boletim => "BOLETIM",
        Historico => "HISTORICO",
    }
}

impl TipoDocumento {
    pub fn prefixo(&self) -> &'static str {
        match self {
            Self::DeclaracaoMatricula => "DM",
            Self::Boletim => "BL",
            Self::Historico => "HE",
        }
    }
}

/// `seq` is 1-based and restarts every calendar year per institution and type.
pub fn numero_documento(tipo: TipoDocumento, ano: i32, seq: i64) -> String {
    format!("{}-{ano}-{seq:05}", tipo.prefixo())
}
