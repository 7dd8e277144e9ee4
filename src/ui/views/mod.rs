mod dashboard;
mod deputy_detail;
mod deputy_list;
mod expense_list;
mod proposal_list;

pub use dashboard::DashboardView;
pub use deputy_detail::DeputyDetailView;
pub use deputy_list::DeputyListView;
pub use expense_list::ExpenseListView;
pub use proposal_list::ProposalListView;
