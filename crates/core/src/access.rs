//! Roles and the capabilities they grant.

text_enum! {
    /// Role of a user account. Every account except `SuperAdmin` belongs to
    /// exactly one institution.
    pub enum Role {
        SuperAdmin => "SUPER_ADMIN",
        Admin => "ADMIN",
        Secretaria => "SECRETARIA",
        Professor => "PROFESSOR",
        Aluno => "ALUNO",
        Financeiro => "FINANCEIRO",
        Rh => "RH",
        Bibliotecario => "BIBLIOTECARIO",
    }
}

/// An action gated by role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    ManageInstitutions,
    ManageUsers,
    ManageAcademicStructure,
    ManageEnrollment,
    EditTeachingPlan,
    ApproveTeachingPlan,
    RecordGrades,
    RecordAttendance,
    CloseAcademicPeriod,
    ReopenAcademicPeriod,
    ManageFinance,
    ManageHr,
    ManageLibrary,
    IssueDocuments,
    ViewReports,
}

impl Role {
    pub fn is_super_admin(&self) -> bool {
        matches!(self, Self::SuperAdmin)
    }

    /// Whether this role may perform `cap` inside its institution.
    pub fn allows(&self, cap: Capability) -> bool {
        use Capability::*;
        match self {
            Self::SuperAdmin => true,
            Self::Admin => !matches!(cap, ManageInstitutions),
            Self::Secretaria => matches!(
                cap,
                ManageUsers
                    | ManageAcademicStructure
                    | ManageEnrollment
                    | IssueDocuments
                    | ViewReports
            ),
            Self::Professor => matches!(
                cap,
                EditTeachingPlan | RecordGrades | RecordAttendance | ViewReports
            ),
            Self::Financeiro => matches!(cap, ManageFinance | ViewReports),
            Self::Rh => matches!(cap, ManageHr),
            Self::Bibliotecario => matches!(cap, ManageLibrary),
            Self::Aluno => false,
        }
    }

    /// Whether an account with this role may create an account with `target`.
    pub fn can_assign(&self, target: Role) -> bool {
        match self {
            Self::SuperAdmin => target != Role::SuperAdmin,
            Self::Admin => !matches!(target, Role::SuperAdmin | Role::Admin),
            Self::Secretaria => matches!(target, Role::Aluno | Role::Professor),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn super_admin_allows_everything() {
        for cap in [
            Capability::ManageInstitutions,
            Capability::ReopenAcademicPeriod,
            Capability::ManageLibrary,
        ] {
            assert!(Role::SuperAdmin.allows(cap));
        }
    }

    #[test]
    fn admin_cannot_manage_institutions() {
        assert!(!Role::Admin.allows(Capability::ManageInstitutions));
        assert!(Role::Admin.allows(Capability::CloseAcademicPeriod));
        assert!(Role::Admin.allows(Capability::ApproveTeachingPlan));
    }

    #[test]
    fn professor_records_but_does_not_approve() {
        assert!(Role::Professor.allows(Capability::RecordGrades));
        assert!(Role::Professor.allows(Capability::EditTeachingPlan));
        assert!(!Role::Professor.allows(Capability::ApproveTeachingPlan));
        assert!(!Role::Professor.allows(Capability::CloseAcademicPeriod));
    }

    #[test]
    fn aluno_has_no_capabilities() {
        assert!(!Role::Aluno.allows(Capability::ViewReports));
        assert!(!Role::Aluno.allows(Capability::RecordGrades));
    }

    #[test]
    fn assignment_rules() {
        assert!(Role::SuperAdmin.can_assign(Role::Admin));
        assert!(!Role::SuperAdmin.can_assign(Role::SuperAdmin));
        assert!(!Role::Admin.can_assign(Role::Admin));
        assert!(Role::Admin.can_assign(Role::Financeiro));
        assert!(Role::Secretaria.can_assign(Role::Aluno));
        assert!(!Role::Secretaria.can_assign(Role::Rh));
        assert!(!Role::Professor.can_assign(Role::Aluno));
    }

    #[test]
    fn role_text_round_trips_through_serde() {
        let json = serde_json::to_string(&Role::SuperAdmin).unwrap();
        assert_eq!(json, "\"SUPER_ADMIN\"");
        assert_eq!("BIBLIOTECARIO".parse::<Role>().unwrap(), Role::Bibliotecario);
        assert!("root".parse::<Role>().is_err());
    }
}
