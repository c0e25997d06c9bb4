//! # 文件收集器
//!
//! 根据输入路径和模式收集待处理的扫描文件列表。
//!
//! ## 功能
//! - 支持单文件和目录输入
//! - glob 模式匹配（逗号分隔多个模式）
//! - 递归目录搜索
//! - 结果按路径排序
//!
//! ## 依赖关系
//! - 被 `commands/calibrate.rs` 调用
//! - 使用 `walkdir` 遍历目录
//! - 使用 `glob` 匹配文件名

use glob::Pattern;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// 默认扫描文件模式
pub const DEFAULT_PATTERN: &str = "*.chi";

/// 文件收集器
pub struct FileCollector {
    /// 输入路径
    input: PathBuf,
    /// 匹配模式列表
    patterns: Vec<Pattern>,
    /// 是否递归
    recursive: bool,
}

impl FileCollector {
    /// 创建新的文件收集器
    pub fn new(input: PathBuf) -> Self {
        Self {
            input,
            patterns: Self::parse_patterns(DEFAULT_PATTERN),
            recursive: false,
        }
    }

    /// 设置匹配模式（逗号分隔的多模式），无效模式被忽略
    pub fn with_pattern(mut self, pattern: &str) -> Self {
        self.patterns = Self::parse_patterns(pattern);
        if self.patterns.is_empty() {
            self.patterns = Self::parse_patterns(DEFAULT_PATTERN);
        }
        self
    }

    /// 设置是否递归搜索
    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    fn parse_patterns(pattern: &str) -> Vec<Pattern> {
        pattern
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .filter_map(|s| Pattern::new(s).ok())
            .collect()
    }

    /// 收集所有匹配的文件
    pub fn collect(&self) -> Vec<PathBuf> {
        if self.input.is_file() {
            return vec![self.input.clone()];
        }

        if !self.input.is_dir() {
            return vec![];
        }

        let max_depth = if self.recursive { usize::MAX } else { 1 };

        let mut files: Vec<PathBuf> = WalkDir::new(&self.input)
            .max_depth(max_depth)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|entry| self.matches_patterns(entry.path()))
            .map(|e| e.path().to_path_buf())
            .collect();

        files.sort();
        files
    }

    /// 检查文件是否匹配任一模式
    fn matches_patterns(&self, path: &Path) -> bool {
        let filename = match path.file_name().and_then(|n| n.to_str()) {
            Some(name) => name,
            None => return false,
        };

        self.patterns.iter().any(|p| p.matches(filename))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_pattern_match() {
        let collector = FileCollector::new(PathBuf::from("."));
        assert!(collector.matches_patterns(Path::new("data/LaB6_0001.chi")));
        assert!(!collector.matches_patterns(Path::new("data/LaB6_d.txt")));

        let collector = collector.with_pattern("*.chi, *.xy");
        assert!(collector.matches_patterns(Path::new("scan.xy")));
    }

    #[test]
    fn test_collect_directory() {
        let dir = std::env::temp_dir().join(format!("xpdcal-collect-{}", std::process::id()));
        fs::create_dir_all(dir.join("nested")).unwrap();
        fs::write(dir.join("b.chi"), "0 1\n").unwrap();
        fs::write(dir.join("a.chi"), "0 1\n").unwrap();
        fs::write(dir.join("notes.txt"), "x\n").unwrap();
        fs::write(dir.join("nested").join("c.chi"), "0 1\n").unwrap();

        let files = FileCollector::new(dir.clone()).collect();
        let names: Vec<_> = files
            .iter()
            .filter_map(|p| p.file_name().and_then(|n| n.to_str()))
            .collect();
        assert_eq!(names, ["a.chi", "b.chi"]);

        let files = FileCollector::new(dir.clone()).recursive(true).collect();
        assert_eq!(files.len(), 3);

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_collect_missing_input() {
        let files = FileCollector::new(PathBuf::from("/nonexistent/xpdcal")).collect();
        assert!(files.is_empty());
    }
}
