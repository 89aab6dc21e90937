// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

//! The route tables of the school's web applications.

use clap::ValueEnum;

use crate::{
    gate::Gate,
    route::{Route, Router},
};

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub(crate) enum App {
    /// The combined application with one portal per role.
    #[default]
    School,
    /// The standalone finance office application.
    FinanceDesk,
}

impl App {
    pub(crate) fn gate(self) -> Gate {
        match self {
            Self::School => Gate::new(Router::new(school())),
            Self::FinanceDesk => Gate::new(Router::new(finance_desk())).with_home("/dashboard"),
        }
    }
}

fn pages(entries: &[(&str, &str)]) -> Vec<Route> {
    entries
        .iter()
        .map(|(path, name)| Route::new(path).named(name))
        .collect()
}

pub(crate) fn school() -> Vec<Route> {
    vec![
        Route::new("/").named("PortalSelector").public(),
        Route::new("/login").named("Login").public(),
        Route::new("/student")
            .named("StudentPortal")
            .children(pages(&[
                ("", "StudentDashboard"),
                ("announcements", "StudentAnnouncements"),
                ("announcements/:id", "StudentEventDetail"),
                ("virtual lab", "StudentSimulations"),
                ("notes", "StudentNotes"),
                ("performance", "StudentPerformance"),
                ("assignments", "StudentAssignments"),
                ("assignments/:id/start", "StudentAssignmentStart"),
                (
                    "assignments/:assignmentId/questions/:questionIndex",
                    "StudentQuestionPage",
                ),
                ("settings", "StudentSettings"),
            ])),
        Route::new("/teachers")
            .named("TeacherPortal")
            .children(pages(&[
                ("", "TeachersDashboard"),
                ("students", "TeachersStudentsPage"),
                ("attendance", "TeachersAttendancePage"),
                ("grades", "TeachersGradesPage"),
                ("announcements", "TeachersAnnouncementsPage"),
                ("assignments", "TeachersAssignmentsPage"),
                ("settings", "TeachersSettings"),
                ("student/:id", "TeachersStudentDetail"),
                ("mark/attendance", "MarkAttendance"),
                ("edit/attendance/:sessionId", "EditAttendance"),
                ("list-grades", "ListGrades"),
                ("exams/create", "CreateExam"),
                ("grade-details", "GradeDetails"),
                ("add/grades", "AddGrades"),
                ("announcements/:id", "TeachersEventDetail"),
                ("results", "ResultsPage"),
                ("create-assignment", "AssignmentBuilder"),
                ("performance", "PerformancePage"),
                (
                    "/assignments/:assignmentId/students/:studentId",
                    "StudentAssignmentResponse",
                ),
            ])),
        Route::new("/principal")
            .named("PrincipalPortal")
            .children(pages(&[
                ("", "PrincipalDashboard"),
                ("students", "PrincipalStudents"),
                ("students/create", "CreateStudent"),
                ("student/:id", "PrincipalStudentDetail"),
                ("teachers", "PrincipalTeachers"),
                ("teacher/:id", "TeachersDetail"),
                ("events", "PrincipalEvents"),
                ("events/create", "EventCreate"),
                ("events/:id", "PrincipalEventDetail"),
                ("finance/overview", "PrincipalFeeOverview"),
                ("finance/transactions", "PrincipalDetailedTransactions"),
                ("finance/expenditure", "PrincipalExpenditureSummary"),
                ("generate-invoice/:id", "PrincipalGenerateInvoice"),
                ("reports", "PrincipalReports"),
                ("student-reports", "StudentReports"),
                ("transactions", "Transactions"),
                ("communications", "PrincipalCommunications"),
                ("parents/:id", "ParentDetails"),
                ("settings", "PrincipalSettings"),
            ])),
        Route::new("/finance")
            .named("FinancePortal")
            .children(pages(&[
                ("", "FinanceDashboard"),
                ("announcements", "FinanceAnnouncements"),
                ("fee-structure", "FinanceFeeStructure"),
                ("fee-details/:id", "FeeDetails"),
                ("fee-create", "FeeCreate"),
                ("fee-print/:id", "FeePrint"),
                ("invoices", "FinanceInvoices"),
                ("invoice-create", "InvoiceCreate"),
                ("invoice-detail/:id", "InvoiceDetail"),
                ("payments", "FinancePayments"),
                ("payment-details/:id", "PaymentDetails"),
                ("expenditures", "FinanceExpenditures"),
                ("expense-details/:id", "ExpenseDetails"),
                ("event-details/:id", "FinanceEventDetail"),
                ("settings", "FinanceSettings"),
            ])),
        Route::new("/parent")
            .named("ParentPortal")
            .children({
                let mut children = pages(&[
                    ("", "ParentDashboard"),
                    ("students", "ParentStudent"),
                    ("assignments", "ParentAssignments"),
                    ("attendance", "ParentAttendance"),
                    ("grades", "ParentGrade"),
                    ("announcements", "ParentAnnouncements"),
                    ("event-details/:id", "ParentEventDetail"),
                    ("settings", "ParentSettings"),
                ]);
                children.push(
                    Route::new("finance")
                        .named("ParentFinance")
                        .redirect_to_name("ParentFeeSummary")
                        .children(pages(&[
                            ("overview", "ParentFeeSummary"),
                            ("fee-structure", "ParentFeeStructure"),
                            ("fee-statement", "ParentFeeStatements"),
                            ("online-payment", "ParentOnlinePayment"),
                        ])),
                );
                children
            }),
    ]
}

pub(crate) fn finance_desk() -> Vec<Route> {
    vec![
        Route::new("/").redirect_to("/login"),
        Route::new("/login").named("login").public(),
        Route::new("/dashboard").children(pages(&[
            ("", "Dashboard"),
            ("announcements", "AnnouncementsPage"),
            ("fee-structure", "FeeStructure"),
            ("invoices", "Invoices"),
            ("payments", "Payments"),
            ("invoice-create", "CreateInvoice"),
            ("invoice-detail/:id", "InvoiceDetail"),
            ("payment-details/:id", "PaymentDetails"),
            ("expenditures", "Expenditures"),
            ("expenses-details/:id", "ExpenseDetails"),
            ("fee-details/:id", "FeeDetails"),
            ("fee-create", "FeeCreate"),
            ("/finance/fees/print/:id", "FeePrint"),
            ("event-details/:id", "EventDetail"),
            ("settings", "Settings"),
        ])),
    ]
}

#[cfg(test)]
mod tests {
    use secrecy::SecretString;

    use crate::{
        api::UserRecord,
        gate::Decision,
        route::RouteDeclaration,
        session::Session,
    };

    use super::*;

    fn signed_in(role: &str) -> Session {
        Session::authenticated(
            SecretString::new("t1".to_owned()),
            SecretString::new("t2".to_owned()),
            UserRecord::with_role(role),
        )
    }

    #[test]
    fn every_portal_page_requires_a_session() {
        // Each portal on its own, so absolute child paths are checked too.
        for portal in school().into_iter().skip(2) {
            let router = Router::new(vec![portal]);
            assert!(router.records().len() > 1);
            for record in router.records() {
                assert_eq!(
                    *record.declaration(),
                    RouteDeclaration::protected(),
                    "{}",
                    record.pattern()
                );
            }
        }

        let router = Router::new(school());
        let resolution = router.resolve("/assignments/3/students/9");
        assert_eq!(resolution.name(), Some("StudentAssignmentResponse"));
        assert_eq!(*resolution.declaration(), RouteDeclaration::protected());
    }

    #[test]
    fn landing_pages_are_public() {
        let gate = App::School.gate();
        let anonymous = Session::default();
        for path in ["/", "/login"] {
            assert_eq!(gate.navigate(path, &anonymous).decision, Decision::Allow);
        }
    }

    #[test]
    fn portals_open_to_any_signed_in_user() {
        let gate = App::School.gate();
        let teacher = signed_in("teacher");

        let navigation = gate.navigate("/teachers/student/42", &teacher);
        assert_eq!(navigation.route.as_deref(), Some("TeachersStudentDetail"));
        assert_eq!(navigation.decision, Decision::Allow);

        let navigation = gate.navigate("/principal/reports", &signed_in("accountant"));
        assert_eq!(navigation.route.as_deref(), Some("PrincipalReports"));
        assert_eq!(navigation.decision, Decision::Allow);

        let navigation = gate.navigate("/student/virtual%20lab", &Session::default());
        assert_eq!(navigation.route.as_deref(), Some("StudentSimulations"));
        assert_eq!(navigation.decision, Decision::RedirectToLogin);
        assert_eq!(gate.location(navigation.decision), Some("/login"));
    }

    #[test]
    fn parent_finance_lands_on_fee_summary() {
        let gate = App::School.gate();
        let navigation = gate.navigate("/parent/finance", &signed_in("parent"));
        assert_eq!(navigation.route.as_deref(), Some("ParentFeeSummary"));
        assert_eq!(navigation.path, "/parent/finance/overview");
        assert_eq!(navigation.decision, Decision::Allow);
    }

    #[test]
    fn finance_desk_redirects_root_to_login() {
        let gate = App::FinanceDesk.gate();
        let navigation = gate.navigate("/", &Session::default());
        assert_eq!(navigation.route.as_deref(), Some("login"));
        assert_eq!(navigation.decision, Decision::Allow);

        let navigation = gate.navigate("/finance/fees/print/7", &Session::default());
        assert_eq!(navigation.route.as_deref(), Some("FeePrint"));
        assert_eq!(navigation.decision, Decision::RedirectToLogin);

        let navigation = gate.navigate("/dashboard/invoices", &signed_in("finance"));
        assert_eq!(navigation.decision, Decision::Allow);
        assert_eq!(gate.location(Decision::RedirectToHome), Some("/dashboard"));
    }
}
