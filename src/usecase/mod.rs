pub mod ids;
pub mod task_list;
