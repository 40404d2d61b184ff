mod gitlab;

pub use gitlab::GitLabClient;
